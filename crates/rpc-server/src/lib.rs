//! RPC Server - JSON-RPC for the local StudentIntro cluster
//!
//! Provides a Solana-compatible HTTP JSON-RPC interface over a `LocalBank`:
//! sendTransaction, getAccountInfo, getLatestBlockhash, getSignatureStatuses,
//! requestAirdrop, getSlot, getHealth, getVersion.

pub mod http_server;
pub mod methods;

pub use http_server::HttpRpcServer;
pub use methods::{RpcContext, RpcError};

/// RPC Server configuration
#[derive(Clone, Debug)]
pub struct RpcServerConfig {
    /// HTTP RPC bind address
    pub http_addr: String,
    /// Lamports credited to each airdrop target listed at startup
    pub faucet_lamports: u64,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8899".to_string(),
            faucet_lamports: 10_000_000_000,
        }
    }
}
