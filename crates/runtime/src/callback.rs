//! SVM account loading straight from the account store

use crate::account_store::AccountStore;
use solana_sdk::{
    account::{AccountSharedData, ReadableAccount},
    pubkey::Pubkey,
};
use solana_svm::transaction_processing_callback::TransactionProcessingCallback;

impl TransactionProcessingCallback for AccountStore {
    /// Index of the account's owner in `owners`, if any
    fn account_matches_owners(&self, account: &Pubkey, owners: &[Pubkey]) -> Option<usize> {
        let account = self.get_account(account)?;
        owners.iter().position(|owner| owner == account.owner())
    }

    fn get_account_shared_data(&self, pubkey: &Pubkey) -> Option<AccountSharedData> {
        self.get_account(pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{account::Account, system_program};

    #[test]
    fn test_account_matches_owners() {
        let store = AccountStore::new();
        let program = Pubkey::new_unique();
        let pubkey = Pubkey::new_unique();
        store.store_account(
            pubkey,
            AccountSharedData::from(Account {
                lamports: 100,
                data: vec![],
                owner: program,
                executable: false,
                rent_epoch: 0,
            }),
        );

        let owners = [system_program::id(), program];
        assert_eq!(store.account_matches_owners(&pubkey, &owners), Some(1));
        assert_eq!(store.account_matches_owners(&pubkey, &owners[..1]), None);
        assert_eq!(
            store.get_account_shared_data(&pubkey).map(|a| a.lamports()),
            Some(100)
        );
    }

    #[test]
    fn test_missing_account() {
        let store = AccountStore::new();
        let pubkey = Pubkey::new_unique();
        assert!(store.get_account_shared_data(&pubkey).is_none());
        assert!(store
            .account_matches_owners(&pubkey, &[system_program::id()])
            .is_none());
    }
}
