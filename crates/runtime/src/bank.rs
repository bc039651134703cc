//! Local Bank
//!
//! Front door of the in-process cluster. Checks what a validator checks
//! before execution (signatures, blockhash age, duplicates), runs one
//! transaction per slot through the processor and remembers the outcome
//! of every signature whose blockhash could still be replayed.

use crate::{
    account_store::AccountStore, processor::IntroProcessor, TransactionResult,
    MAX_RECENT_BLOCKHASHES,
};
use solana_sdk::{
    account::{Account, AccountSharedData, ReadableAccount, WritableAccount},
    clock::Slot,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    system_program,
    transaction::{SanitizedTransaction, Transaction, TransactionError},
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};
use thiserror::Error;

/// Bank errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Transaction has no signatures")]
    MissingSignature,

    #[error("Transaction signature verification failed: {0}")]
    SignatureFailure(Signature),

    #[error("Blockhash not found: {0}")]
    BlockhashNotFound(Hash),

    #[error("Transaction already processed: {0}")]
    AlreadyProcessed(Signature),

    #[error("Transaction sanitization failed: {0}")]
    Sanitize(TransactionError),

    #[error("Transaction {signature} failed: {error}")]
    TransactionFailed {
        signature: Signature,
        error: TransactionError,
        logs: Vec<String>,
    },

    #[error("Cannot airdrop to {0}: not a system account")]
    InvalidAirdropTarget(Pubkey),

    #[error("Airdrop to {0} overflows its balance")]
    LamportsOverflow(Pubkey),
}

impl BankError {
    /// The `TransactionError` a validator reports for this rejection
    pub fn transaction_error(&self) -> Option<TransactionError> {
        match self {
            BankError::MissingSignature => Some(TransactionError::SanitizeFailure),
            BankError::SignatureFailure(_) => Some(TransactionError::SignatureFailure),
            BankError::BlockhashNotFound(_) => Some(TransactionError::BlockhashNotFound),
            BankError::AlreadyProcessed(_) => Some(TransactionError::AlreadyProcessed),
            BankError::Sanitize(error) | BankError::TransactionFailed { error, .. } => {
                Some(error.clone())
            }
            BankError::InvalidAirdropTarget(_) | BankError::LamportsOverflow(_) => None,
        }
    }
}

/// Outcome recorded for a processed signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: Slot,
    pub err: Option<TransactionError>,
    pub logs: Vec<String>,
}

/// Single-node bank over an account store
pub struct LocalBank {
    processor: IntroProcessor,
    account_store: Arc<AccountStore>,
    /// Blockhash of each recent slot, oldest first
    recent_blockhashes: VecDeque<(Slot, Hash)>,
    /// Outcomes of signatures that landed inside the blockhash window
    statuses: HashMap<Signature, SignatureStatus>,
}

impl LocalBank {
    /// Create a bank with an empty account store
    pub fn new() -> Self {
        let account_store = Arc::new(AccountStore::new());
        let processor = IntroProcessor::new(account_store.clone());
        let mut recent_blockhashes = VecDeque::with_capacity(MAX_RECENT_BLOCKHASHES);
        recent_blockhashes.push_back((processor.current_slot(), processor.current_blockhash()));

        tracing::info!(
            "Local bank started at slot {} with program {}",
            processor.current_slot(),
            student_intro_program::id()
        );

        Self {
            processor,
            account_store,
            recent_blockhashes,
            statuses: HashMap::new(),
        }
    }

    /// Blockhash new transactions should reference
    pub fn latest_blockhash(&self) -> Hash {
        self.processor.current_blockhash()
    }

    /// Last slot at which the latest blockhash is still accepted
    pub fn last_valid_block_height(&self) -> u64 {
        self.slot() + MAX_RECENT_BLOCKHASHES as u64
    }

    /// Check whether `blockhash` is inside the recent window
    pub fn is_blockhash_valid(&self, blockhash: &Hash) -> bool {
        self.recent_blockhashes
            .iter()
            .any(|(_, recent)| recent == blockhash)
    }

    /// Current slot
    pub fn slot(&self) -> Slot {
        self.processor.current_slot()
    }

    /// Fetch an account
    pub fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.account_store.get_account(pubkey).map(Account::from)
    }

    /// Status of a previously seen signature
    pub fn signature_status(&self, signature: &Signature) -> Option<&SignatureStatus> {
        self.statuses.get(signature)
    }

    /// Credit `lamports` to a system account, creating it if needed
    pub fn airdrop(&mut self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, BankError> {
        let mut account = self
            .account_store
            .get_account(pubkey)
            .unwrap_or_else(|| AccountSharedData::new(0, 0, &system_program::id()));

        if account.executable() || account.owner() != &system_program::id() {
            return Err(BankError::InvalidAirdropTarget(*pubkey));
        }

        let balance = account
            .lamports()
            .checked_add(lamports)
            .ok_or(BankError::LamportsOverflow(*pubkey))?;
        account.set_lamports(balance);

        let slot = self.slot();
        self.account_store.store_account(*pubkey, account);

        let signature = Signature::new_unique();
        self.statuses.insert(
            signature,
            SignatureStatus {
                slot,
                err: None,
                logs: vec![],
            },
        );
        self.advance_slot();

        tracing::info!("Airdropped {} lamports to {} ({})", lamports, pubkey, signature);
        Ok(signature)
    }

    /// Verify, execute and record a transaction
    pub fn process_transaction(&mut self, tx: Transaction) -> Result<TransactionResult, BankError> {
        let signature = *tx.signatures.first().ok_or(BankError::MissingSignature)?;

        tx.verify()
            .map_err(|_| BankError::SignatureFailure(signature))?;

        let blockhash = tx.message.recent_blockhash;
        if !self.is_blockhash_valid(&blockhash) {
            return Err(BankError::BlockhashNotFound(blockhash));
        }

        if self.statuses.contains_key(&signature) {
            return Err(BankError::AlreadyProcessed(signature));
        }

        let sanitized = SanitizedTransaction::try_from_legacy_transaction(tx, &HashSet::new())
            .map_err(BankError::Sanitize)?;

        let result = self
            .processor
            .process_transactions(std::slice::from_ref(&sanitized))
            .into_iter()
            .next()
            .ok_or(BankError::Sanitize(TransactionError::SanitizeFailure))?;

        self.statuses.insert(
            signature,
            SignatureStatus {
                slot: result.slot,
                err: result.error.clone(),
                logs: result.logs.clone(),
            },
        );
        self.advance_slot();

        match (result.success, result.error.clone()) {
            (false, Some(error)) => {
                tracing::warn!("Transaction {} failed: {}", signature, error);
                Err(BankError::TransactionFailed {
                    signature,
                    error,
                    logs: result.logs,
                })
            }
            _ => {
                tracing::debug!("Transaction {} landed in slot {}", signature, result.slot);
                Ok(result)
            }
        }
    }

    /// Move to the next slot and slide the blockhash window.
    ///
    /// A signature that landed before the oldest recent blockhash can only
    /// be resent with an expired blockhash, so its status is dropped too.
    fn advance_slot(&mut self) {
        self.processor.advance_slot();
        self.recent_blockhashes
            .push_back((self.processor.current_slot(), self.processor.current_blockhash()));
        while self.recent_blockhashes.len() > MAX_RECENT_BLOCKHASHES {
            self.recent_blockhashes.pop_front();
        }

        if let Some(&(oldest, _)) = self.recent_blockhashes.front() {
            let before = self.statuses.len();
            self.statuses.retain(|_, status| status.slot >= oldest);
            let evicted = before - self.statuses.len();
            if evicted > 0 {
                tracing::trace!("Evicted {} signature statuses older than slot {}", evicted, oldest);
            }
        }
    }
}

impl Default for LocalBank {
    fn default() -> Self {
        Self::new()
    }
}
