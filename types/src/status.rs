//! Activity confirmation status.

use serde::{Deserialize, Serialize};

/// Confirmation status shared by transactions and swaps.
///
/// Both `Pending` and `PendingTrusted` mean the activity is awaiting confirmation by
/// the blockchain. `PendingTrusted` is awaiting confirmation and was initiated by
/// this wallet; `Pending` comes from an external source (e.g. dapp emulation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityStatus {
    Pending,
    PendingTrusted,
    Completed,
    Failed,
    /// Swaps only.
    Expired,
}

impl ActivityStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::PendingTrusted)
    }
}

impl Default for ActivityStatus {
    fn default() -> Self {
        Self::Completed
    }
}
