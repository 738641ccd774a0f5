//! Fundamental types for the wallet activity engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! activities (transactions and swaps), activity id conventions, chains, account ids,
//! amounts, and timestamps.

pub mod account;
pub mod activity;
pub mod amount;
pub mod chain;
pub mod error;
pub mod id;
pub mod status;
pub mod time;

pub use account::AccountId;
pub use activity::{
    Activity, ActivityExtra, ActivityKind, AddressMetadata, CexStatus, NftRef, SwapActivity,
    SwapCexExtras, TransactionActivity, TransactionType,
};
pub use amount::Amount;
pub use chain::Chain;
pub use error::TypesError;
pub use id::{
    build_backend_swap_id, build_local_tx_id, build_tx_id, is_backend_swap_id, is_local_id,
    is_id_suitable_for_fetching_timestamp, parse_tx_id, ParsedTxId, UnusualTxType,
};
pub use status::ActivityStatus;
pub use time::Timestamp;
