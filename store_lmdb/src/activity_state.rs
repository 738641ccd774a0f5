//! LMDB implementation of ActivityStateStore.
//!
//! One row per account in the `account_activities` database, keyed by account id.
//! Values are the JSON encoding of [`AccountState`].

use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use mtw_store::{AccountState, ActivityStateStore, StoreError};
use mtw_types::AccountId;

use crate::LmdbError;

pub struct LmdbActivityStateStore {
    pub(crate) env: Arc<Env>,
    pub(crate) account_activities_db: Database<Str, Bytes>,
}

fn decode(account: &str, bytes: &[u8]) -> Result<AccountState, LmdbError> {
    serde_json::from_slice(bytes)
        .map_err(|e| LmdbError::Serialization(format!("account state {account}: {e}")))
}

impl ActivityStateStore for LmdbActivityStateStore {
    fn upsert(&self, state: &AccountState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(state).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.account_activities_db
            .put(&mut wtxn, state.account_id.as_str(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get(&self, account_id: &AccountId) -> Result<Option<AccountState>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .account_activities_db
            .get(&rtxn, account_id.as_str())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(decode(account_id.as_str(), bytes)?)),
            None => Ok(None),
        }
    }

    fn fetch_all(&self) -> Result<Vec<AccountState>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut states = Vec::new();
        let iter = self
            .account_activities_db
            .iter(&rtxn)
            .map_err(LmdbError::from)?;
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            states.push(decode(key, val)?);
        }
        Ok(states)
    }

    fn delete(&self, account_id: &AccountId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.account_activities_db
            .delete(&mut wtxn, account_id.as_str())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.account_activities_db
            .clear(&mut wtxn)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self
            .account_activities_db
            .len(&rtxn)
            .map_err(LmdbError::from)?;
        Ok(count)
    }
}
