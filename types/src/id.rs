//! Activity id conventions.
//!
//! Chain activity ids have the shape `hash[:subId[:type]]`. Two `type` suffixes carry
//! meaning for reconciliation: `local` marks an optimistic record created by this
//! client before the chain confirmed it, and `backend-swap` marks a record sourced
//! from the centralized swap backend instead of a blockchain.

use std::fmt;
use std::str::FromStr;

pub const LOCAL_SUFFIX: &str = ":local";
pub const BACKEND_SWAP_SUFFIX: &str = ":backend-swap";

/// The optional third component of an activity id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnusualTxType {
    BackendSwap,
    Local,
    Additional,
}

impl UnusualTxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackendSwap => "backend-swap",
            Self::Local => "local",
            Self::Additional => "additional",
        }
    }
}

impl fmt::Display for UnusualTxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnusualTxType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backend-swap" => Ok(Self::BackendSwap),
            "local" => Ok(Self::Local),
            "additional" => Ok(Self::Additional),
            _ => Err(()),
        }
    }
}

/// The components of an activity id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTxId {
    /// Stable hash fragment, identical for the pending and confirmed shapes of an id.
    pub hash: String,
    pub sub_id: Option<String>,
    pub tx_type: Option<UnusualTxType>,
}

/// Split an id into its `hash`, `subId` and `type` components. Unknown types are dropped.
pub fn parse_tx_id(id: &str) -> ParsedTxId {
    let mut parts = id.split(':');
    let hash = parts.next().unwrap_or_default().to_string();
    let sub_id = parts.next().map(str::to_string);
    let tx_type = parts.next().and_then(|t| t.parse().ok());
    ParsedTxId {
        hash,
        sub_id,
        tx_type,
    }
}

pub fn build_tx_id(hash: &str, sub_id: Option<&str>, tx_type: Option<UnusualTxType>) -> String {
    match (sub_id, tx_type) {
        (None, None) => hash.to_string(),
        (Some(sub_id), None) => format!("{hash}:{sub_id}"),
        (sub_id, Some(tx_type)) => format!("{hash}:{}:{tx_type}", sub_id.unwrap_or_default()),
    }
}

pub fn build_local_tx_id(hash: &str, sub_id: Option<u32>) -> String {
    let sub_id = sub_id.map(|n| n.to_string());
    build_tx_id(hash, sub_id.as_deref(), Some(UnusualTxType::Local))
}

pub fn build_backend_swap_id(backend_id: &str) -> String {
    build_tx_id(backend_id, None, Some(UnusualTxType::BackendSwap))
}

pub fn is_local_id(id: &str) -> bool {
    id.ends_with(LOCAL_SUFFIX)
}

pub fn is_backend_swap_id(id: &str) -> bool {
    id.ends_with(BACKEND_SWAP_SUFFIX)
}

/// Whether the activity with this id originates on a chain and can serve as a
/// pagination cursor.
pub fn is_id_suitable_for_fetching_timestamp(id: &str) -> bool {
    !is_local_id(id) && !is_backend_swap_id(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_components() {
        let parsed = parse_tx_id("abc123:7:local");
        assert_eq!(parsed.hash, "abc123");
        assert_eq!(parsed.sub_id.as_deref(), Some("7"));
        assert_eq!(parsed.tx_type, Some(UnusualTxType::Local));
    }

    #[test]
    fn parses_bare_hash() {
        let parsed = parse_tx_id("abc123");
        assert_eq!(parsed.hash, "abc123");
        assert_eq!(parsed.sub_id, None);
        assert_eq!(parsed.tx_type, None);
    }

    #[test]
    fn builds_ids_with_suffixes() {
        assert_eq!(build_local_tx_id("h", None), "h::local");
        assert_eq!(build_local_tx_id("h", Some(2)), "h:2:local");
        assert_eq!(build_backend_swap_id("s1"), "s1::backend-swap");
        assert_eq!(build_tx_id("h", Some("3"), None), "h:3");
        assert_eq!(build_tx_id("h", None, None), "h");
    }

    #[test]
    fn suffix_predicates() {
        assert!(is_local_id("h::local"));
        assert!(!is_local_id("h:1"));
        assert!(is_backend_swap_id("s1::backend-swap"));
        assert!(is_id_suitable_for_fetching_timestamp("h:1"));
        assert!(!is_id_suitable_for_fetching_timestamp("h::local"));
        assert!(!is_id_suitable_for_fetching_timestamp("s1::backend-swap"));
    }

    #[test]
    fn local_and_confirmed_ids_share_hash() {
        let local = parse_tx_id(&build_local_tx_id("deadbeef", Some(0)));
        let confirmed = parse_tx_id("deadbeef:0");
        assert_eq!(local.hash, confirmed.hash);
    }
}
