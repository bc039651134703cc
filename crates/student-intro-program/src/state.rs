//! StudentIntro Program State

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{constants::MAX_ACCOUNT_LEN, error::StudentIntroError};

/// Account discriminator, `sha256("account:StudentIntro")[..8]`
pub const STUDENT_INTRO_DISCRIMINATOR: [u8; 8] = [107, 21, 208, 51, 236, 154, 244, 239];

/// Intro record - one per student wallet
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StudentIntro {
    /// Wallet that created the intro and is allowed to change it
    pub student: Pubkey,
    /// Display name
    pub name: String,
    /// Intro message
    pub message: String,
}

impl StudentIntro {
    /// Size of everything except the two string bodies:
    /// discriminator + student + two u32 length prefixes
    pub const FIXED_LEN: usize = 8 + 32 + 4 + 4;

    /// Exact account size for an intro with this name and message
    pub fn space(name: &str, message: &str) -> usize {
        Self::FIXED_LEN + name.len() + message.len()
    }

    /// Like [`StudentIntro::space`], rejecting sizes the program won't allocate
    pub fn checked_space(name: &str, message: &str) -> Result<usize, StudentIntroError> {
        let space = Self::FIXED_LEN
            .checked_add(name.len())
            .and_then(|len| len.checked_add(message.len()))
            .ok_or(StudentIntroError::ArithmeticOverflow)?;
        if space > MAX_ACCOUNT_LEN {
            return Err(StudentIntroError::DataTooLarge);
        }
        Ok(space)
    }

    /// Packed size of this record
    pub fn packed_len(&self) -> usize {
        Self::space(&self.name, &self.message)
    }

    /// Derive the intro PDA for a student wallet.
    ///
    /// The only seed is the wallet key itself; clients of every deployment
    /// rely on this, so it must not change.
    pub fn derive_pda(student: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[student.as_ref()], program_id)
    }

    /// Check whether raw account data carries the intro discriminator
    pub fn is_initialized(data: &[u8]) -> bool {
        data.len() >= STUDENT_INTRO_DISCRIMINATOR.len()
            && data[..STUDENT_INTRO_DISCRIMINATOR.len()] == STUDENT_INTRO_DISCRIMINATOR
    }

    /// Encode as account data (discriminator followed by the Borsh body)
    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.packed_len());
        data.extend_from_slice(&STUDENT_INTRO_DISCRIMINATOR);
        data.extend_from_slice(self.student.as_ref());
        write_string(&mut data, &self.name);
        write_string(&mut data, &self.message);
        data
    }

    /// Encode into an account buffer that is already sized for this record
    pub fn pack_into(&self, dst: &mut [u8]) -> Result<(), StudentIntroError> {
        let data = self.pack();
        if dst.len() != data.len() {
            return Err(StudentIntroError::InvalidAccountData);
        }
        dst.copy_from_slice(&data);
        Ok(())
    }

    /// Decode account data
    pub fn unpack(data: &[u8]) -> Result<Self, StudentIntroError> {
        if !Self::is_initialized(data) {
            return Err(StudentIntroError::AccountNotInitialized);
        }
        let mut body = &data[STUDENT_INTRO_DISCRIMINATOR.len()..];
        Self::deserialize(&mut body).map_err(|_| StudentIntroError::InvalidAccountData)
    }
}

/// Borsh string layout: u32 LE length followed by the UTF-8 bytes
pub(crate) fn write_string(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intro(name: &str, message: &str) -> StudentIntro {
        StudentIntro {
            student: Pubkey::new_unique(),
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_space_matches_packed_len() {
        let record = intro("name", "message");
        assert_eq!(StudentIntro::space("name", "message"), 8 + 32 + 4 + 4 + 4 + 7);
        assert_eq!(record.pack().len(), record.packed_len());
    }

    #[test]
    fn test_pack_matches_borsh_body() {
        let record = intro("realloc", "realloc");
        let packed = record.pack();
        assert_eq!(&packed[..8], &STUDENT_INTRO_DISCRIMINATOR);
        assert_eq!(&packed[8..], borsh::to_vec(&record).unwrap().as_slice());
        assert_eq!(StudentIntro::unpack(&packed).unwrap(), record);
    }

    #[test]
    fn test_unpack_rejects_missing_discriminator() {
        let mut packed = intro("a", "b").pack();
        packed[0] ^= 0xff;
        assert_eq!(
            StudentIntro::unpack(&packed),
            Err(StudentIntroError::AccountNotInitialized)
        );
        assert_eq!(
            StudentIntro::unpack(&[]),
            Err(StudentIntroError::AccountNotInitialized)
        );
    }

    #[test]
    fn test_unpack_rejects_truncated_body() {
        let packed = intro("name", "message").pack();
        assert_eq!(
            StudentIntro::unpack(&packed[..packed.len() - 1]),
            Err(StudentIntroError::InvalidAccountData)
        );
    }

    #[test]
    fn test_pack_into_requires_exact_size() {
        let record = intro("name", "message");
        let mut too_small = vec![0u8; record.packed_len() - 1];
        assert_eq!(
            record.pack_into(&mut too_small),
            Err(StudentIntroError::InvalidAccountData)
        );

        let mut exact = vec![0u8; record.packed_len()];
        record.pack_into(&mut exact).unwrap();
        assert_eq!(StudentIntro::unpack(&exact).unwrap(), record);
    }

    #[test]
    fn test_checked_space_limit() {
        let at_limit = "x".repeat(MAX_ACCOUNT_LEN - StudentIntro::FIXED_LEN);
        assert_eq!(
            StudentIntro::checked_space(&at_limit, ""),
            Ok(MAX_ACCOUNT_LEN)
        );
        assert_eq!(
            StudentIntro::checked_space(&at_limit, "!"),
            Err(StudentIntroError::DataTooLarge)
        );
    }

    #[test]
    fn test_derive_pda_is_deterministic() {
        let student = Pubkey::new_unique();
        let program_id = crate::id();
        let first = StudentIntro::derive_pda(&student, &program_id);
        let second = StudentIntro::derive_pda(&student, &program_id);
        assert_eq!(first, second);
        assert_eq!(
            first.0,
            Pubkey::create_program_address(&[student.as_ref(), &[first.1]], &program_id).unwrap()
        );

        let other = StudentIntro::derive_pda(&Pubkey::new_unique(), &program_id);
        assert_ne!(first.0, other.0);
    }
}
