//! Cluster access
//!
//! The client talks to a cluster through [`Cluster`]; `RpcCluster` reaches a
//! validator over JSON-RPC and `LocalCluster` drives an in-process bank.

mod local;
mod rpc;

pub use local::LocalCluster;
pub use rpc::RpcCluster;

use crate::error::ClientError;
use async_trait::async_trait;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

#[async_trait]
pub trait Cluster: Send + Sync {
    /// Blockhash to sign new transactions against
    async fn latest_blockhash(&self) -> Result<Hash, ClientError>;

    /// Submit a signed transaction and wait until it is confirmed
    async fn send_and_confirm(&self, tx: &Transaction) -> Result<Signature, ClientError>;

    /// Fetch an account, `None` if it does not exist
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ClientError>;

    /// Credit lamports to `pubkey` and wait until the credit is confirmed
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64)
        -> Result<Signature, ClientError>;
}
