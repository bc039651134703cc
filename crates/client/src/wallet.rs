//! Wallet loading
//!
//! Keypairs come from a Solana CLI keypair file (a JSON array of 64 bytes)
//! or from the `PRIVATE_KEY` environment variable holding the same bytes,
//! with or without the surrounding brackets.

use crate::error::ClientError;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::{
    env,
    path::{Path, PathBuf},
};

/// Environment variable consulted when no keypair file is given
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// `~/.config/solana/id.json`, if a home directory is known
pub fn default_keypair_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("solana")
            .join("id.json")
    })
}

/// Parse keypair bytes written as `[1,2,...]` or `1,2,...`
pub fn keypair_from_str(s: &str) -> Result<Keypair, ClientError> {
    let trimmed = s.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    let bytes = inner
        .split(',')
        .map(|b| b.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| ClientError::Keypair(format!("invalid keypair byte: {}", e)))?;

    Keypair::from_bytes(&bytes).map_err(|e| ClientError::Keypair(e.to_string()))
}

/// Read a Solana CLI keypair file
pub fn read_keypair(path: &Path) -> Result<Keypair, ClientError> {
    read_keypair_file(path)
        .map_err(|e| ClientError::Keypair(format!("cannot read {}: {}", path.display(), e)))
}

/// Resolve the wallet: explicit path, then `PRIVATE_KEY`, then the default path
pub fn load_keypair(path: Option<&Path>) -> Result<Keypair, ClientError> {
    load_keypair_with(path, env::var(PRIVATE_KEY_ENV).ok(), default_keypair_path())
}

fn load_keypair_with(
    path: Option<&Path>,
    private_key: Option<String>,
    default_path: Option<PathBuf>,
) -> Result<Keypair, ClientError> {
    if let Some(path) = path {
        tracing::debug!("Loading wallet from {}", path.display());
        return read_keypair(path);
    }

    if let Some(private_key) = private_key.filter(|s| !s.trim().is_empty()) {
        tracing::debug!("Loading wallet from {}", PRIVATE_KEY_ENV);
        return keypair_from_str(&private_key);
    }

    match default_path {
        Some(path) => {
            tracing::debug!("Loading wallet from {}", path.display());
            read_keypair(&path)
        }
        None => Err(ClientError::Keypair(format!(
            "no keypair file given, {} unset and no home directory",
            PRIVATE_KEY_ENV
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;
    use std::{fs, io::Write};

    fn keypair_json(keypair: &Keypair) -> String {
        serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_read_keypair() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(keypair_json(&keypair).as_bytes()).unwrap();

        let loaded = read_keypair(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_read_keypair_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a keypair").unwrap();
        assert!(matches!(
            read_keypair(file.path()),
            Err(ClientError::Keypair(_))
        ));
    }

    #[test]
    fn test_keypair_from_str_with_and_without_brackets() {
        let keypair = Keypair::new();
        let json = keypair_json(&keypair);
        let bare = json.trim_start_matches('[').trim_end_matches(']').to_string();

        assert_eq!(keypair_from_str(&json).unwrap().pubkey(), keypair.pubkey());
        assert_eq!(keypair_from_str(&bare).unwrap().pubkey(), keypair.pubkey());
        assert!(keypair_from_str("1,2,3").is_err());
        assert!(keypair_from_str("[300]").is_err());
    }

    #[test]
    fn test_resolution_order() {
        let from_file = Keypair::new();
        let from_env = Keypair::new();
        let from_default = Keypair::new();

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("wallet.json");
        fs::write(&file_path, keypair_json(&from_file)).unwrap();
        let default_path = dir.path().join("id.json");
        fs::write(&default_path, keypair_json(&from_default)).unwrap();

        let env_value = Some(keypair_json(&from_env));

        let loaded =
            load_keypair_with(Some(&file_path), env_value.clone(), Some(default_path.clone()))
                .unwrap();
        assert_eq!(loaded.pubkey(), from_file.pubkey());

        let loaded = load_keypair_with(None, env_value, Some(default_path.clone())).unwrap();
        assert_eq!(loaded.pubkey(), from_env.pubkey());

        let loaded = load_keypair_with(None, Some("  ".to_string()), Some(default_path)).unwrap();
        assert_eq!(loaded.pubkey(), from_default.pubkey());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_keypair_with(None, None, Some(dir.path().join("missing.json")));
        assert!(matches!(result, Err(ClientError::Keypair(_))));
        assert!(load_keypair_with(None, None, None).is_err());
    }
}
