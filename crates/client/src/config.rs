//! Client Configuration

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

/// Default JSON-RPC endpoint of a local validator
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

/// How far a transaction must have progressed before it counts as confirmed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level: {}", other)),
        }
    }
}

/// Where transactions are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTarget {
    /// A JSON-RPC endpoint
    Rpc(String),
    /// A fresh in-process cluster
    Local,
}

impl Default for ClusterTarget {
    fn default() -> Self {
        ClusterTarget::Rpc(DEFAULT_RPC_URL.to_string())
    }
}

/// Everything the client needs to reach a cluster and sign for the student
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cluster: ClusterTarget,
    /// Keypair file; falls back to `PRIVATE_KEY` and then the Solana CLI default
    pub keypair_path: Option<PathBuf>,
    pub program_id: Pubkey,
    pub commitment: Commitment,
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterTarget::default(),
            keypair_path: None,
            program_id: student_intro_program::id(),
            commitment: Commitment::default(),
            confirm_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_parse_and_order() {
        assert_eq!("confirmed".parse::<Commitment>().unwrap(), Commitment::Confirmed);
        assert!("recent".parse::<Commitment>().is_err());
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
        assert_eq!(Commitment::Finalized.to_string(), "finalized");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.cluster, ClusterTarget::Rpc(DEFAULT_RPC_URL.to_string()));
        assert_eq!(config.program_id, student_intro_program::id());
        assert_eq!(config.commitment, Commitment::Confirmed);
        assert_eq!(config.confirm_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_commitment_serde() {
        let json = serde_json::to_string(&Commitment::Processed).unwrap();
        assert_eq!(json, "\"processed\"");
        let parsed: Commitment = serde_json::from_str("\"finalized\"").unwrap();
        assert_eq!(parsed, Commitment::Finalized);
    }
}
