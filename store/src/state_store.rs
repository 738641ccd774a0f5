//! Durable storage of per-account activity state.

use mtw_types::AccountId;

use crate::{AccountState, StoreError};

/// Blind key-value persistence of [`AccountState`] rows, one per account.
///
/// The store offers no queries beyond "by account id" and "all states". Writes
/// replace the whole row.
pub trait ActivityStateStore: Send + Sync {
    fn upsert(&self, state: &AccountState) -> Result<(), StoreError>;

    fn get(&self, account_id: &AccountId) -> Result<Option<AccountState>, StoreError>;

    fn fetch_all(&self) -> Result<Vec<AccountState>, StoreError>;

    /// Deleting an unknown account is not an error.
    fn delete(&self, account_id: &AccountId) -> Result<(), StoreError>;

    fn delete_all(&self) -> Result<(), StoreError>;

    fn count(&self) -> Result<u64, StoreError>;
}
