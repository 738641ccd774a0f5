//! Blockchain identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A blockchain an account has addresses on. Pending activities and the
/// initial-load flag are tracked per chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ton,
    Tron,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ton, Chain::Tron];

    /// Wire name, also the prefix of the chain's token slugs (`ton-...`, `tron-...`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ton => "ton",
            Self::Tron => "tron",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ton" => Ok(Self::Ton),
            "tron" => Ok(Self::Tron),
            _ => Err(TypesError::UnknownChain(s.to_string())),
        }
    }
}
