//! StudentIntro Program Errors

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// StudentIntro program errors
///
/// Discriminants are the on-chain `Custom` error codes and must stay stable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentIntroError {
    #[error("Invalid instruction data")]
    InvalidInstructionData = 0,

    #[error("Intro account does not match the student's PDA")]
    InvalidPda = 1,

    #[error("Intro account already initialized")]
    AccountAlreadyInitialized = 2,

    #[error("Intro account not initialized")]
    AccountNotInitialized = 3,

    #[error("Invalid account owner")]
    InvalidAccountOwner = 4,

    #[error("Signer is not the student that owns this intro")]
    InvalidAuthority = 5,

    #[error("Intro exceeds the maximum account size")]
    DataTooLarge = 6,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7,

    #[error("Invalid account data")]
    InvalidAccountData = 8,
}

impl StudentIntroError {
    /// Map a `Custom` error code back to the error, if it is one of ours
    pub fn from_code(code: u32) -> Option<Self> {
        use StudentIntroError::*;
        let error = match code {
            0 => InvalidInstructionData,
            1 => InvalidPda,
            2 => AccountAlreadyInitialized,
            3 => AccountNotInitialized,
            4 => InvalidAccountOwner,
            5 => InvalidAuthority,
            6 => DataTooLarge,
            7 => ArithmeticOverflow,
            8 => InvalidAccountData,
            _ => return None,
        };
        Some(error)
    }
}

impl From<StudentIntroError> for ProgramError {
    fn from(e: StudentIntroError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

#[cfg(feature = "builtin")]
impl From<StudentIntroError> for solana_program::instruction::InstructionError {
    fn from(e: StudentIntroError) -> Self {
        solana_program::instruction::InstructionError::Custom(e as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 0..=8 {
            let error = StudentIntroError::from_code(code).unwrap();
            assert_eq!(error as u32, code);
        }
        assert_eq!(StudentIntroError::from_code(9), None);
    }

    #[test]
    fn test_program_error_mapping() {
        let err: ProgramError = StudentIntroError::InvalidAuthority.into();
        assert_eq!(err, ProgramError::Custom(5));
    }
}
