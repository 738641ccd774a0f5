//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::EngineError;

/// Configuration for the activity engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Maximum number of named LMDB databases.
    #[serde(default = "default_lmdb_max_dbs")]
    pub lmdb_max_dbs: u32,

    /// Page size requested from the bridge when loading older history.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// How many recent chain activities beyond the incoming batch size are
    /// scanned when hiding already confirmed local activities.
    #[serde(default = "default_hide_outdated_extra_depth")]
    pub hide_outdated_extra_depth: usize,

    /// Do not count scam transfers towards the pagination limit.
    #[serde(default = "default_true")]
    pub hide_scam_transfers: bool,

    /// Capacity of the `ActivitiesChanged` broadcast channel.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Wallet bridge JSON-RPC endpoint.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./mtw_data")
}

fn default_lmdb_map_size() -> usize {
    1024 * 1024 * 1024
}

fn default_lmdb_max_dbs() -> u32 {
    4
}

fn default_page_limit() -> usize {
    60
}

fn default_hide_outdated_extra_depth() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_notification_capacity() -> usize {
    1024
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:4321".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lmdb_map_size: default_lmdb_map_size(),
            lmdb_max_dbs: default_lmdb_max_dbs(),
            page_limit: default_page_limit(),
            hide_outdated_extra_depth: default_hide_outdated_extra_depth(),
            hide_scam_transfers: default_true(),
            notification_capacity: default_notification_capacity(),
            bridge_url: default_bridge_url(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
