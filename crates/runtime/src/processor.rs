//! Transaction Processor
//!
//! Wraps the solana-svm TransactionBatchProcessor with the system program
//! and the StudentIntro builtin registered.

use crate::account_store::AccountStore;
use solana_compute_budget::compute_budget::ComputeBudget;
use solana_program_runtime::{
    invoke_context::BuiltinFunctionWithContext,
    loaded_programs::{BlockRelation, ForkGraph, ProgramCacheEntry},
};
use solana_sdk::{
    account::{create_account_shared_data_with_fields, Account, AccountSharedData, ReadableAccount},
    clock::{Clock, Slot, UnixTimestamp},
    epoch_schedule::EpochSchedule,
    feature_set::FeatureSet,
    fee::FeeStructure,
    hash::Hash,
    native_loader,
    pubkey::Pubkey,
    rent::Rent,
    signature::Signature,
    sysvar::{Sysvar, SysvarId},
    transaction::{SanitizedTransaction, TransactionError},
};
use solana_svm::{
    account_loader::{CheckedTransactionDetails, TransactionCheckResult},
    transaction_processing_result::ProcessedTransaction,
    transaction_processor::{
        ExecutionRecordingConfig, LoadAndExecuteSanitizedTransactionsOutput,
        TransactionBatchProcessor, TransactionProcessingConfig, TransactionProcessingEnvironment,
    },
};
use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};

/// Linear fork graph: a single node never forks
#[derive(Debug, Default, Clone)]
pub struct LinearForkGraph;

impl ForkGraph for LinearForkGraph {
    fn relationship(&self, a: Slot, b: Slot) -> BlockRelation {
        if a == b {
            BlockRelation::Equal
        } else if a < b {
            BlockRelation::Ancestor
        } else {
            BlockRelation::Descendant
        }
    }
}

/// Result of processing a single transaction
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub signature: Signature,
    pub slot: Slot,
    pub success: bool,
    pub error: Option<TransactionError>,
    pub logs: Vec<String>,
}

/// SVM transaction processor for the local cluster
pub struct IntroProcessor {
    processor: TransactionBatchProcessor<LinearForkGraph>,
    account_store: Arc<AccountStore>,
    /// Builtin program accounts, never written back from a transaction
    builtin_program_ids: HashSet<Pubkey>,
    current_slot: Slot,
    current_epoch: u64,
    current_blockhash: Hash,
    /// All features enabled
    feature_set: Arc<FeatureSet>,
    /// Kept alive for the program cache, which only holds a weak reference
    _fork_graph: Arc<RwLock<LinearForkGraph>>,
}

impl IntroProcessor {
    /// Create a new processor over `account_store`
    pub fn new(account_store: Arc<AccountStore>) -> Self {
        let slot = 0;
        let epoch = 0;

        Self::setup_sysvar_accounts(&account_store, slot, epoch);

        let fork_graph = Arc::new(RwLock::new(LinearForkGraph));
        let processor = TransactionBatchProcessor::<LinearForkGraph>::new_uninitialized(slot, epoch);

        // The program cache needs the fork graph for program lookups
        if let Ok(mut program_cache) = processor.program_cache.write() {
            program_cache.set_fork_graph(Arc::downgrade(&fork_graph));
        }

        let mut this = Self {
            processor,
            account_store,
            builtin_program_ids: HashSet::new(),
            current_slot: slot,
            current_epoch: epoch,
            current_blockhash: Hash::new_unique(),
            feature_set: Arc::new(FeatureSet::all_enabled()),
            _fork_graph: fork_graph,
        };

        this.register_builtins();
        this.processor
            .fill_missing_sysvar_cache_entries(this.account_store.as_ref());

        this
    }

    /// Store Clock, Rent and EpochSchedule sysvars
    fn setup_sysvar_accounts(store: &AccountStore, slot: Slot, epoch: u64) {
        Self::store_sysvar(store, &Self::clock(slot, epoch));
        Self::store_sysvar(store, &Rent::default());
        Self::store_sysvar(store, &EpochSchedule::default());
    }

    fn clock(slot: Slot, epoch: u64) -> Clock {
        let unix_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as UnixTimestamp)
            .unwrap_or_default();
        Clock {
            slot,
            epoch_start_timestamp: 0,
            epoch,
            leader_schedule_epoch: epoch,
            unix_timestamp,
        }
    }

    fn store_sysvar<T: Sysvar + SysvarId>(store: &AccountStore, sysvar: &T) {
        let account = create_account_shared_data_with_fields(sysvar, (1, 0));
        store.store_account(T::id(), account);
    }

    /// Register builtin programs with the processor
    fn register_builtins(&mut self) {
        self.add_builtin(
            "system_program",
            solana_sdk::system_program::id(),
            solana_system_program::system_processor::Entrypoint::vm,
        );

        self.add_builtin(
            "student_intro_program",
            student_intro_program::id(),
            student_intro_program::builtin::Entrypoint::vm,
        );
    }

    /// Store the builtin's executable account and add it to the program cache
    fn add_builtin(&mut self, name: &str, program_id: Pubkey, entrypoint: BuiltinFunctionWithContext) {
        let account = AccountSharedData::from(Account {
            lamports: 1,
            data: name.as_bytes().to_vec(),
            owner: native_loader::id(),
            executable: true,
            rent_epoch: 0,
        });
        self.account_store.store_account(program_id, account);
        self.builtin_program_ids.insert(program_id);

        let builtin = ProgramCacheEntry::new_builtin(self.current_slot, name.len(), entrypoint);
        self.processor
            .add_builtin(self.account_store.as_ref(), program_id, name, builtin);
    }

    /// Process a batch of transactions and write back modified accounts
    pub fn process_transactions(
        &mut self,
        transactions: &[SanitizedTransaction],
    ) -> Vec<TransactionResult> {
        if transactions.is_empty() {
            return vec![];
        }

        let fee_structure = FeeStructure::default();

        let environment = TransactionProcessingEnvironment {
            blockhash: self.current_blockhash,
            epoch_total_stake: Some(1_000_000_000),
            epoch_vote_accounts: None,
            feature_set: self.feature_set.clone(),
            fee_structure: Some(&fee_structure),
            lamports_per_signature: 0,
            rent_collector: None,
        };

        let config = TransactionProcessingConfig {
            compute_budget: Some(ComputeBudget::default()),
            log_messages_bytes_limit: Some(10_000),
            recording_config: ExecutionRecordingConfig {
                enable_log_recording: true,
                enable_return_data_recording: true,
                enable_cpi_recording: false,
            },
            ..Default::default()
        };

        // Age and signatures are checked by the bank before a batch gets here
        let check_results: Vec<TransactionCheckResult> = transactions
            .iter()
            .map(|_| {
                Ok(CheckedTransactionDetails {
                    nonce: None,
                    lamports_per_signature: 0,
                })
            })
            .collect();

        let output = self.processor.load_and_execute_sanitized_transactions(
            self.account_store.as_ref(),
            transactions,
            check_results,
            &environment,
            &config,
        );

        self.process_output(transactions, output)
    }

    /// Convert SVM output into results, storing the writable accounts of
    /// successful transactions
    fn process_output(
        &self,
        transactions: &[SanitizedTransaction],
        output: LoadAndExecuteSanitizedTransactionsOutput,
    ) -> Vec<TransactionResult> {
        transactions
            .iter()
            .zip(output.processing_results)
            .map(|(tx, result)| {
                let signature = *tx.signature();
                let (error, logs) = match result {
                    Ok(ProcessedTransaction::Executed(executed)) => {
                        let executed = *executed;
                        let details = executed.execution_details;
                        let logs = details.log_messages.unwrap_or_default();
                        match details.status {
                            Ok(()) => {
                                let written =
                                    self.write_back(tx, &executed.loaded_transaction.accounts);
                                tracing::debug!(
                                    "Transaction {} succeeded: {} accounts written",
                                    signature,
                                    written
                                );
                                (None, logs)
                            }
                            Err(e) => (Some(e), logs),
                        }
                    }
                    // Accounts failed to load, nothing ran
                    Ok(ProcessedTransaction::FeesOnly(fees_only)) => {
                        (Some(fees_only.load_error), vec![])
                    }
                    Err(e) => (Some(e), vec![]),
                };

                if let Some(e) = &error {
                    tracing::debug!("Transaction {} failed: {:?}", signature, e);
                }

                TransactionResult {
                    signature,
                    slot: self.current_slot,
                    success: error.is_none(),
                    error,
                    logs,
                }
            })
            .collect()
    }

    /// Store the accounts a transaction could modify. Read-only accounts,
    /// program accounts and the placeholders the SVM loads for invoked
    /// programs are left alone.
    fn write_back(
        &self,
        tx: &SanitizedTransaction,
        accounts: &[(Pubkey, AccountSharedData)],
    ) -> usize {
        let message = tx.message();
        let mut written = 0;
        for (index, (pubkey, account)) in accounts.iter().enumerate() {
            if !message.is_writable(index)
                || account.executable()
                || self.builtin_program_ids.contains(pubkey)
            {
                continue;
            }
            self.account_store.store_account(*pubkey, account.clone());
            written += 1;
        }
        written
    }

    /// Advance to the next slot with a fresh blockhash and clock
    pub fn advance_slot(&mut self) {
        self.current_slot += 1;
        self.current_blockhash = Hash::new_unique();

        let clock = Self::clock(self.current_slot, self.current_epoch);
        Self::store_sysvar(&self.account_store, &clock);

        self.processor.reset_sysvar_cache();
        self.processor
            .fill_missing_sysvar_cache_entries(self.account_store.as_ref());

        tracing::trace!("Advanced to slot {}", self.current_slot);
    }

    /// Get current slot
    pub fn current_slot(&self) -> Slot {
        self.current_slot
    }

    /// Get current blockhash
    pub fn current_blockhash(&self) -> Hash {
        self.current_blockhash
    }
}
