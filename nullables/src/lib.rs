//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external collaborators (durable storage, the activity fetcher)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return scripted values
//! - Record how they were called
//! - Can be told to fail
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod fetcher;
pub mod store;

pub use fetcher::{FetchCall, NullFetcher};
pub use store::NullStateStore;
