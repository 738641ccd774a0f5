//! Fetching activity history from the wallet bridge.
//!
//! The engine only depends on the [`ActivityFetcher`] trait. [`BridgeClient`] is
//! the production implementation. Timeouts and retries belong to the client,
//! never to the callers.

pub mod bridge;
pub mod error;
pub mod fetcher;

pub use bridge::BridgeClient;
pub use error::FetchError;
pub use fetcher::ActivityFetcher;
