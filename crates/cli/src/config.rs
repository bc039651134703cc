//! CLI Configuration

use anyhow::{Context, Result};
use intro_client::{config::DEFAULT_RPC_URL, ClientConfig, ClusterTarget, Commitment};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{path::Path, path::PathBuf, str::FromStr, time::Duration};

/// CLI configuration, optionally read from a JSON file and then
/// overridden by command-line flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Run against a fresh in-process cluster instead of `rpc_url`
    pub local: bool,
    /// Keypair file for the student wallet
    pub keypair_path: Option<PathBuf>,
    /// StudentIntro program id (base58)
    pub program_id: Option<String>,
    pub commitment: Commitment,
    pub confirm_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Lamports airdropped to the wallet before running on a local cluster
    pub local_airdrop_lamports: u64,
    /// Bind address for `validator`
    pub rpc_addr: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            local: false,
            keypair_path: None,
            program_id: None,
            commitment: Commitment::Confirmed,
            confirm_timeout_ms: 30_000,
            poll_interval_ms: 500,
            local_airdrop_lamports: 10_000_000_000,
            rpc_addr: "127.0.0.1:8899".to_string(),
        }
    }
}

impl CliConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        match &self.program_id {
            Some(id) => Pubkey::from_str(id).with_context(|| format!("invalid program id {}", id)),
            None => Ok(student_intro_program::id()),
        }
    }

    pub fn to_client_config(&self) -> Result<ClientConfig> {
        let cluster = if self.local {
            ClusterTarget::Local
        } else {
            ClusterTarget::Rpc(self.rpc_url.clone())
        };

        Ok(ClientConfig {
            cluster,
            keypair_path: self.keypair_path.clone(),
            program_id: self.program_id()?,
            commitment: self.commitment,
            confirm_timeout: Duration::from_millis(self.confirm_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"rpc_url": "http://localhost:9999", "commitment": "finalized"}"#)
            .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9999");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.poll_interval_ms, 500);
        assert!(!config.local);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(CliConfig::load(&path).is_err());
        assert!(CliConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_to_client_config() {
        let config = CliConfig {
            local: true,
            confirm_timeout_ms: 1_000,
            ..Default::default()
        };
        let client = config.to_client_config().unwrap();
        assert_eq!(client.cluster, ClusterTarget::Local);
        assert_eq!(client.program_id, student_intro_program::id());
        assert_eq!(client.confirm_timeout, Duration::from_secs(1));

        let config = CliConfig {
            program_id: Some("not-a-key".to_string()),
            ..Default::default()
        };
        assert!(config.to_client_config().is_err());
    }
}
