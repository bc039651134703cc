//! In-process cluster backed by a `LocalBank`

use super::Cluster;
use crate::error::ClientError;
use async_trait::async_trait;
use intro_runtime::LocalBank;
use parking_lot::Mutex;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use std::sync::Arc;

/// Cluster that executes transactions synchronously on a local bank
#[derive(Clone)]
pub struct LocalCluster {
    bank: Arc<Mutex<LocalBank>>,
}

impl LocalCluster {
    /// Cluster over a fresh bank
    pub fn new() -> Self {
        Self::with_bank(Arc::new(Mutex::new(LocalBank::new())))
    }

    /// Cluster sharing an existing bank
    pub fn with_bank(bank: Arc<Mutex<LocalBank>>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &Arc<Mutex<LocalBank>> {
        &self.bank
    }
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cluster for LocalCluster {
    async fn latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(self.bank.lock().latest_blockhash())
    }

    async fn send_and_confirm(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        // Execution runs the SVM under the bank lock
        let bank = self.bank.clone();
        let tx = tx.clone();
        let result = tokio::task::spawn_blocking(move || bank.lock().process_transaction(tx))
            .await
            .map_err(|e| ClientError::Rpc(format!("local execution panicked: {}", e)))??;
        Ok(result.signature)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ClientError> {
        Ok(self.bank.lock().get_account(pubkey))
    }

    async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, ClientError> {
        Ok(self.bank.lock().airdrop(pubkey, lamports)?)
    }
}
