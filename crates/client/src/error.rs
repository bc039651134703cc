//! Client Errors

use intro_runtime::BankError;
use solana_sdk::{
    instruction::InstructionError, pubkey::Pubkey, signature::Signature,
    transaction::TransactionError,
};
use student_intro_program::StudentIntroError;
use std::{str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Account {pubkey} is owned by {owner}, not the StudentIntro program")]
    InvalidOwner { pubkey: Pubkey, owner: Pubkey },

    #[error("Invalid account data for {pubkey}: {source}")]
    InvalidAccountData {
        pubkey: Pubkey,
        #[source]
        source: StudentIntroError,
    },

    #[error("Transaction failed: {message}")]
    TransactionFailed {
        signature: Option<Signature>,
        error: Option<TransactionError>,
        message: String,
        logs: Vec<String>,
    },

    #[error("Transaction {signature} not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        signature: Signature,
        timeout: Duration,
    },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Keypair error: {0}")]
    Keypair(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The error `program_id` raised in a failed transaction.
    ///
    /// A custom code only counts when the logs show `program_id` as the
    /// first program to fail. Codes raised by a program it invoked are
    /// theirs, not its own.
    pub fn program_error(&self, program_id: &Pubkey) -> Option<StudentIntroError> {
        let ClientError::TransactionFailed {
            error: Some(TransactionError::InstructionError(_, InstructionError::Custom(code))),
            logs,
            ..
        } = self
        else {
            return None;
        };
        if failing_program(logs)? != *program_id {
            return None;
        }
        StudentIntroError::from_code(*code)
    }
}

/// Program of the first "Program <id> failed: ..." log line
fn failing_program(logs: &[String]) -> Option<Pubkey> {
    logs.iter().find_map(|line| {
        let rest = line.strip_prefix("Program ")?;
        let (id, tail) = rest.split_once(' ')?;
        if !tail.starts_with("failed:") {
            return None;
        }
        Pubkey::from_str(id).ok()
    })
}

impl From<BankError> for ClientError {
    fn from(e: BankError) -> Self {
        let error = e.transaction_error();
        let message = match &error {
            Some(error) => error.to_string(),
            None => e.to_string(),
        };
        match e {
            BankError::TransactionFailed {
                signature, logs, ..
            } => ClientError::TransactionFailed {
                signature: Some(signature),
                error,
                message,
                logs,
            },
            _ => ClientError::TransactionFailed {
                signature: None,
                error,
                message,
                logs: vec![],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::system_program;

    fn failed(error: TransactionError, logs: &[&str]) -> ClientError {
        ClientError::TransactionFailed {
            signature: None,
            message: error.to_string(),
            error: Some(error),
            logs: logs.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn program_failed(program_id: &Pubkey, code: u32) -> String {
        format!(
            "Program {} failed: custom program error: {:#x}",
            program_id, code
        )
    }

    #[test]
    fn test_program_error_from_bank_failure() {
        let program_id = student_intro_program::id();
        let error: ClientError = BankError::TransactionFailed {
            signature: Signature::default(),
            error: TransactionError::InstructionError(0, InstructionError::Custom(2)),
            logs: vec![
                format!("Program {} invoke [1]", program_id),
                "Program log: Add student intro".to_string(),
                program_failed(&program_id, 2),
            ],
        }
        .into();
        assert_eq!(
            error.program_error(&program_id),
            Some(StudentIntroError::AccountAlreadyInitialized)
        );
        assert_eq!(error.program_error(&Pubkey::new_unique()), None);
    }

    #[test]
    fn test_invoked_program_code_is_not_ours() {
        // System program `AccountAlreadyInUse` (0) surfacing through a CPI
        let program_id = student_intro_program::id();
        let error = failed(
            TransactionError::InstructionError(0, InstructionError::Custom(0)),
            &[
                &format!("Program {} invoke [1]", program_id),
                &format!("Program {} invoke [2]", system_program::id()),
                &program_failed(&system_program::id(), 0),
                &program_failed(&program_id, 0),
            ],
        );
        assert_eq!(error.program_error(&program_id), None);
    }

    #[test]
    fn test_code_without_logs_is_unattributed() {
        let error = failed(
            TransactionError::InstructionError(0, InstructionError::Custom(3)),
            &[],
        );
        assert_eq!(error.program_error(&student_intro_program::id()), None);
    }

    #[test]
    fn test_no_program_error() {
        let program_id = student_intro_program::id();
        assert_eq!(
            ClientError::Rpc("down".to_string()).program_error(&program_id),
            None
        );

        let error: ClientError = BankError::MissingSignature.into();
        assert_eq!(error.program_error(&program_id), None);

        let error = failed(
            TransactionError::InstructionError(0, InstructionError::MissingRequiredSignature),
            &[&format!(
                "Program {} failed: missing required signature for instruction",
                program_id
            )],
        );
        assert_eq!(error.program_error(&program_id), None);
    }

    #[test]
    fn test_bank_rejection_keeps_typed_error() {
        let error: ClientError = BankError::BlockhashNotFound(Default::default()).into();
        match error {
            ClientError::TransactionFailed { error, .. } => {
                assert_eq!(error, Some(TransactionError::BlockhashNotFound))
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
