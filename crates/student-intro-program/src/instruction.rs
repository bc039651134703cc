//! StudentIntro Program Instructions
//!
//! Instruction data is an 8-byte discriminator followed by Borsh-encoded
//! arguments, the same framing Anchor uses.

use borsh::BorshDeserialize;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::{error::StudentIntroError, state::write_string, state::StudentIntro};

/// Instruction discriminators, `sha256("global:<name>")[..8]`
pub mod discriminator {
    pub const ADD_STUDENT_INTRO: [u8; 8] = [202, 164, 25, 216, 6, 171, 214, 185];
    pub const UPDATE_STUDENT_INTRO: [u8; 8] = [62, 28, 38, 115, 8, 50, 244, 79];
    pub const CLOSE: [u8; 8] = [98, 165, 201, 177, 108, 65, 206, 96];
}

#[derive(BorshDeserialize)]
struct IntroArgs {
    name: String,
    message: String,
}

/// StudentIntro program instructions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudentIntroInstruction {
    /// Create the student's intro account
    ///
    /// Accounts:
    /// 0. `[writable]` Intro account (PDA of the student key)
    /// 1. `[signer, writable]` Student (payer)
    /// 2. `[]` System program
    AddStudentIntro { name: String, message: String },

    /// Rewrite the intro, resizing the account to fit
    ///
    /// Accounts:
    /// 0. `[writable]` Intro account (PDA of the student key)
    /// 1. `[signer, writable]` Student (pays or receives the rent difference)
    /// 2. `[]` System program
    UpdateStudentIntro { name: String, message: String },

    /// Close the intro account, returning its lamports to the student
    ///
    /// Accounts:
    /// 0. `[writable]` Intro account (PDA of the student key)
    /// 1. `[signer, writable]` Student
    Close,
}

impl StudentIntroInstruction {
    /// Decode instruction data
    pub fn unpack(data: &[u8]) -> Result<Self, StudentIntroError> {
        if data.len() < 8 {
            return Err(StudentIntroError::InvalidInstructionData);
        }
        let (tag, mut rest) = data.split_at(8);

        match tag {
            t if t == discriminator::ADD_STUDENT_INTRO => {
                let args = IntroArgs::deserialize(&mut rest)
                    .map_err(|_| StudentIntroError::InvalidInstructionData)?;
                Ok(Self::AddStudentIntro {
                    name: args.name,
                    message: args.message,
                })
            }
            t if t == discriminator::UPDATE_STUDENT_INTRO => {
                let args = IntroArgs::deserialize(&mut rest)
                    .map_err(|_| StudentIntroError::InvalidInstructionData)?;
                Ok(Self::UpdateStudentIntro {
                    name: args.name,
                    message: args.message,
                })
            }
            t if t == discriminator::CLOSE => Ok(Self::Close),
            _ => Err(StudentIntroError::InvalidInstructionData),
        }
    }

    /// Encode instruction data
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::AddStudentIntro { name, message } => {
                pack_with_args(&discriminator::ADD_STUDENT_INTRO, name, message)
            }
            Self::UpdateStudentIntro { name, message } => {
                pack_with_args(&discriminator::UPDATE_STUDENT_INTRO, name, message)
            }
            Self::Close => discriminator::CLOSE.to_vec(),
        }
    }
}

fn pack_with_args(tag: &[u8; 8], name: &str, message: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + 4 + name.len() + 4 + message.len());
    data.extend_from_slice(tag);
    write_string(&mut data, name);
    write_string(&mut data, message);
    data
}

/// Build an `add_student_intro` instruction for `student`
pub fn add_student_intro(
    program_id: &Pubkey,
    student: &Pubkey,
    name: &str,
    message: &str,
) -> Instruction {
    let data = StudentIntroInstruction::AddStudentIntro {
        name: name.to_string(),
        message: message.to_string(),
    }
    .pack();
    Instruction::new_with_bytes(*program_id, &data, intro_accounts(program_id, student, true))
}

/// Build an `update_student_intro` instruction for `student`
pub fn update_student_intro(
    program_id: &Pubkey,
    student: &Pubkey,
    name: &str,
    message: &str,
) -> Instruction {
    let data = StudentIntroInstruction::UpdateStudentIntro {
        name: name.to_string(),
        message: message.to_string(),
    }
    .pack();
    Instruction::new_with_bytes(*program_id, &data, intro_accounts(program_id, student, true))
}

/// Build a `close` instruction for `student`
pub fn close(program_id: &Pubkey, student: &Pubkey) -> Instruction {
    let data = StudentIntroInstruction::Close.pack();
    Instruction::new_with_bytes(*program_id, &data, intro_accounts(program_id, student, false))
}

fn intro_accounts(program_id: &Pubkey, student: &Pubkey, with_system: bool) -> Vec<AccountMeta> {
    let (intro_pda, _) = StudentIntro::derive_pda(student, program_id);
    let mut accounts = vec![
        AccountMeta::new(intro_pda, false),
        AccountMeta::new(*student, true),
    ];
    if with_system {
        accounts.push(AccountMeta::new_readonly(system_program::id(), false));
    }
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_add() {
        let ix = StudentIntroInstruction::AddStudentIntro {
            name: "name".to_string(),
            message: "message".to_string(),
        };
        let data = ix.pack();
        assert_eq!(&data[..8], &discriminator::ADD_STUDENT_INTRO);
        assert_eq!(&data[8..12], &4u32.to_le_bytes());
        assert_eq!(StudentIntroInstruction::unpack(&data).unwrap(), ix);
    }

    #[test]
    fn test_unpack_close_ignores_trailing_bytes() {
        let mut data = discriminator::CLOSE.to_vec();
        data.push(7);
        assert_eq!(
            StudentIntroInstruction::unpack(&data).unwrap(),
            StudentIntroInstruction::Close
        );
    }

    #[test]
    fn test_unpack_rejects_bad_data() {
        assert_eq!(
            StudentIntroInstruction::unpack(&[1, 2, 3]),
            Err(StudentIntroError::InvalidInstructionData)
        );
        assert_eq!(
            StudentIntroInstruction::unpack(&[0u8; 8]),
            Err(StudentIntroError::InvalidInstructionData)
        );
        // Discriminator present but the args are cut off
        let mut data = discriminator::UPDATE_STUDENT_INTRO.to_vec();
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(b"short");
        assert_eq!(
            StudentIntroInstruction::unpack(&data),
            Err(StudentIntroError::InvalidInstructionData)
        );
    }

    #[test]
    fn test_instruction_accounts() {
        let program_id = crate::id();
        let student = Pubkey::new_unique();
        let (intro_pda, _) = StudentIntro::derive_pda(&student, &program_id);

        let add = add_student_intro(&program_id, &student, "name", "message");
        assert_eq!(add.program_id, program_id);
        assert_eq!(add.accounts.len(), 3);
        assert_eq!(add.accounts[0], AccountMeta::new(intro_pda, false));
        assert_eq!(add.accounts[1], AccountMeta::new(student, true));
        assert_eq!(add.accounts[2].pubkey, system_program::id());

        let close = close(&program_id, &student);
        assert_eq!(close.accounts.len(), 2);
        assert_eq!(close.data, discriminator::CLOSE.to_vec());
    }
}
