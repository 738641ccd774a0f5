//! LMDB storage backend for wallet activity state.
//!
//! Implements the storage traits from `mtw-store` using the `heed` LMDB bindings.
//! All databases live in a single environment opened by [`LmdbEnvironment`].

pub mod activity_state;
pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;

pub use activity_state::LmdbActivityStateStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
