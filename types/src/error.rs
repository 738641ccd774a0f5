//! Error type for parsing the fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("invalid activity: {0}")]
    InvalidActivity(String),
}
