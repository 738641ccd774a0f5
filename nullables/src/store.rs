//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use mtw_store::{AccountState, ActivityStateStore, StoreError};
use mtw_types::AccountId;

/// An in-memory activity state store.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStateStore {
    states: Mutex<HashMap<AccountId, AccountState>>,
    fail_writes: AtomicBool,
    upserts: AtomicUsize,
}

impl NullStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts with the given rows.
    pub fn with_states(states: impl IntoIterator<Item = AccountState>) -> Self {
        let store = Self::new();
        store.states.lock().unwrap().extend(
            states
                .into_iter()
                .map(|state| (state.account_id.clone(), state)),
        );
        store
    }

    /// Make every following write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful upserts so far.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }
}

impl ActivityStateStore for NullStateStore {
    fn upsert(&self, state: &AccountState) -> Result<(), StoreError> {
        self.check_writable()?;
        self.states
            .lock()
            .unwrap()
            .insert(state.account_id.clone(), state.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, account_id: &AccountId) -> Result<Option<AccountState>, StoreError> {
        Ok(self.states.lock().unwrap().get(account_id).cloned())
    }

    fn fetch_all(&self) -> Result<Vec<AccountState>, StoreError> {
        Ok(self.states.lock().unwrap().values().cloned().collect())
    }

    fn delete(&self, account_id: &AccountId) -> Result<(), StoreError> {
        self.check_writable()?;
        self.states.lock().unwrap().remove(account_id);
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.states.lock().unwrap().clear();
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.states.lock().unwrap().len() as u64)
    }
}
