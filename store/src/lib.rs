//! Per-account activity state and abstract storage traits.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these traits.
//! The engine depends only on the traits and on [`AccountState`].

pub mod account_state;
pub mod error;
pub mod meta;
pub mod state_store;

pub use account_state::AccountState;
pub use error::StoreError;
pub use meta::MetaStore;
pub use state_store::ActivityStateStore;
