//! In-memory account storage using DashMap for concurrent access

use dashmap::DashMap;
use solana_sdk::{
    account::{AccountSharedData, ReadableAccount},
    pubkey::Pubkey,
};

/// Thread-safe in-memory account storage
///
/// Zero-lamport accounts are never kept: storing one removes the entry,
/// which is how closed accounts disappear from the cluster.
#[derive(Default)]
pub struct AccountStore {
    accounts: DashMap<Pubkey, AccountSharedData>,
}

impl AccountStore {
    /// Create a new empty account store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an account by pubkey
    pub fn get_account(&self, pubkey: &Pubkey) -> Option<AccountSharedData> {
        self.accounts.get(pubkey).map(|r| r.value().clone())
    }

    /// Store an account, or drop it if it has no lamports left
    pub fn store_account(&self, pubkey: Pubkey, account: AccountSharedData) {
        if account.lamports() == 0 {
            if self.accounts.remove(&pubkey).is_some() {
                tracing::debug!("Account {} closed", pubkey);
            }
            return;
        }
        self.accounts.insert(pubkey, account);
    }

    /// Check if an account exists
    pub fn account_exists(&self, pubkey: &Pubkey) -> bool {
        self.accounts.contains_key(pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::account::Account;

    fn account(lamports: u64, owner: Pubkey) -> AccountSharedData {
        AccountSharedData::from(Account {
            lamports,
            data: vec![1, 2, 3],
            owner,
            executable: false,
            rent_epoch: 0,
        })
    }

    #[test]
    fn test_store_and_get() {
        let store = AccountStore::new();
        let pubkey = Pubkey::new_unique();

        store.store_account(pubkey, account(1000, Pubkey::new_unique()));

        let retrieved = store.get_account(&pubkey).unwrap();
        assert_eq!(retrieved.lamports(), 1000);
        assert_eq!(retrieved.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_zero_lamport_store_removes_account() {
        let store = AccountStore::new();
        let pubkey = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        store.store_account(pubkey, account(10, owner));
        assert!(store.account_exists(&pubkey));

        store.store_account(pubkey, account(0, owner));
        assert!(!store.account_exists(&pubkey));
        assert!(store.get_account(&pubkey).is_none());

        // Never-stored zero-lamport accounts stay absent
        let other = Pubkey::new_unique();
        store.store_account(other, account(0, owner));
        assert!(!store.account_exists(&other));
    }
}
