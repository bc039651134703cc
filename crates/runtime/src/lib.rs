//! Intro Runtime - single-node in-process cluster
//!
//! This crate provides the local execution environment for the StudentIntro
//! program:
//! - Transaction processing via solana-svm
//! - In-memory account storage
//! - A bank that tracks blockhashes, signature statuses and airdrops

pub mod account_store;
pub mod bank;
mod callback;
pub mod processor;


pub use account_store::AccountStore;
pub use bank::{BankError, LocalBank, SignatureStatus};
pub use processor::{IntroProcessor, TransactionResult};

/// Number of recent blockhashes a transaction may reference
pub const MAX_RECENT_BLOCKHASHES: usize = 150;
