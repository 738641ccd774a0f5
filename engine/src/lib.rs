//! Per-account wallet activity store.
//!
//! The engine owns the in-memory [`AccountState`](mtw_store::AccountState) of
//! every account, applies inbound activity updates with the reconciliation
//! rules from `mtw-reconcile`, pages older history through an
//! [`ActivityFetcher`](mtw_fetch::ActivityFetcher), persists every change in
//! the background and notifies observers of what changed.

pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod persister;
pub mod shutdown;
pub mod state_updater;
pub mod storage;
pub mod store;
pub mod tracing_spans;

pub use config::EngineConfig;
pub use error::EngineError;
pub use events::{
    ActivitiesChanged, ActivityUpdate, ChangeNotifier, InitialActivities, NewActivities,
    NewLocalActivities,
};
pub use logging::{init_logging, LogFormat};
pub use metrics::EngineMetrics;
pub use persister::Persister;
pub use shutdown::ShutdownController;
pub use storage::open_state_store;
pub use store::ActivityStore;
