//! StudentIntro Program
//!
//! Stores one intro record (name + message) per wallet in a PDA derived
//! from the wallet's public key. Records can be created, rewritten with a
//! different size (the account is reallocated), and closed.
//!
//! Account Structure:
//! - StudentIntro: `[discriminator(8) | student(32) | name | message]`
//!
//! The instruction and account encodings match the Anchor build of the
//! same program, so clients can talk to either deployment.

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

#[cfg(feature = "builtin")]
pub mod builtin;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

pub use error::StudentIntroError;
pub use instruction::StudentIntroInstruction;
pub use state::StudentIntro;

solana_program::declare_id!("GKW5wWmYXw5ZYbBPCEc3ogEKZi5ToJqtNrijMoEnhBfC");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

/// Program entrypoint
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::process(program_id, accounts, instruction_data)
}

/// Constants
pub mod constants {
    /// Largest account the program will create or grow to.
    /// Matches the per-instruction realloc ceiling of the runtime.
    pub const MAX_ACCOUNT_LEN: usize = 10_240;

    /// Compute units charged by the native builtin per instruction
    pub const BUILTIN_COMPUTE_UNITS: u64 = 1_500;
}
