//! Opening the durable activity state store.

use std::sync::Arc;

use mtw_fetch::ActivityFetcher;
use mtw_store::ActivityStateStore;
use mtw_store_lmdb::LmdbEnvironment;

use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::store::ActivityStore;
use crate::EngineError;

/// Open (or create) the LMDB environment under `config.data_dir`.
pub fn open_state_store(config: &EngineConfig) -> Result<Arc<dyn ActivityStateStore>, EngineError> {
    let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_max_dbs, config.lmdb_map_size)?;
    Ok(Arc::new(env.activity_state_store()))
}

impl ActivityStore {
    /// Open the store on top of the LMDB environment named by `config`.
    pub async fn open_lmdb(
        config: EngineConfig,
        fetcher: Arc<dyn ActivityFetcher>,
        metrics: Arc<EngineMetrics>,
    ) -> Result<Self, EngineError> {
        let state_store = open_state_store(&config)?;
        Ok(Self::open(config, state_store, fetcher, metrics).await)
    }
}
