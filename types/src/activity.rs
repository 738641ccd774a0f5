//! Activity records: the unified history entry for transactions and swaps.
//!
//! The serialized shape follows the wallet bridge: a `kind` tag selects the variant
//! and fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::id::{is_backend_swap_id, is_local_id, parse_tx_id, ParsedTxId};
use crate::{ActivityStatus, Amount, Timestamp};

/// Flags attached by the client when it creates an activity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityExtra {
    /// The transfer was sent through the gasless relay, which resubmits it with a
    /// different hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_w5_gasless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    Stake,
    Unstake,
    UnstakeRequest,
    CallContract,
    Excess,
    ContractDeploy,
    Bounced,
    Mint,
    Burn,
    AuctionBid,
    NftTrade,
    DnsChangeAddress,
    DnsChangeSite,
    DnsChangeSubdomains,
    DnsChangeStorage,
    DnsDelete,
    DnsRenew,
    LiquidityDeposit,
    LiquidityWithdraw,
    Swap,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_scam: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_memo_required: Option<bool>,
}

/// Reference to the NFT moved by a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftRef {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionActivity {
    pub id: String,
    pub timestamp: Timestamp,
    /// Chain logical time, when the chain has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<i64>,
    /// Normalized hash of the external message. Stable across the pending and
    /// confirmed states of the same trace (TON only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_msg_hash_norm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_reload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_load_details: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ActivityExtra>,
    pub amount: Amount,
    #[serde(default)]
    pub from_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_comment: Option<String>,
    #[serde(default)]
    pub fee: Amount,
    pub slug: String,
    pub is_incoming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_address: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AddressMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft: Option<NftRef>,
    pub status: ActivityStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CexStatus {
    New,
    Waiting,
    Confirming,
    Exchanging,
    Sending,
    Finished,
    Failed,
    Refunded,
    Hold,
    Overdue,
    Expired,
    Pending,
}

/// Fields present on swaps routed through the centralized exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapCexExtras {
    pub payin_address: String,
    pub payout_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payin_extra_id: Option<String>,
    pub status: CexStatus,
    pub transaction_id: String,
}

/// A token swap. Amounts are decimal strings exactly as the swap backend reports them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapActivity {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_msg_hash_norm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_reload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_load_details: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ActivityExtra>,
    pub from: String,
    pub from_amount: String,
    pub to: String,
    #[serde(default)]
    pub to_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub our_fee: Option<String>,
    pub status: ActivityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_canceled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cex: Option<SwapCexExtras>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Transaction,
    Swap,
}

/// One entry of an account's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Activity {
    Transaction(TransactionActivity),
    Swap(SwapActivity),
}

impl Activity {
    pub fn id(&self) -> &str {
        match self {
            Self::Transaction(tx) => &tx.id,
            Self::Swap(swap) => &swap.id,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Transaction(tx) => tx.timestamp,
            Self::Swap(swap) => swap.timestamp,
        }
    }

    pub fn lt(&self) -> Option<i64> {
        match self {
            Self::Transaction(tx) => tx.lt,
            Self::Swap(swap) => swap.lt,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::Transaction(_) => ActivityKind::Transaction,
            Self::Swap(_) => ActivityKind::Swap,
        }
    }

    pub fn as_transaction(&self) -> Option<&TransactionActivity> {
        match self {
            Self::Transaction(tx) => Some(tx),
            Self::Swap(_) => None,
        }
    }

    pub fn as_swap(&self) -> Option<&SwapActivity> {
        match self {
            Self::Swap(swap) => Some(swap),
            Self::Transaction(_) => None,
        }
    }

    pub fn external_msg_hash_norm(&self) -> Option<&str> {
        match self {
            Self::Transaction(tx) => tx.external_msg_hash_norm.as_deref(),
            Self::Swap(swap) => swap.external_msg_hash_norm.as_deref(),
        }
    }

    pub fn should_hide(&self) -> bool {
        match self {
            Self::Transaction(tx) => tx.should_hide == Some(true),
            Self::Swap(swap) => swap.should_hide == Some(true),
        }
    }

    pub fn set_should_hide(&mut self, hide: bool) {
        match self {
            Self::Transaction(tx) => tx.should_hide = Some(hide),
            Self::Swap(swap) => swap.should_hide = Some(hide),
        }
    }

    pub fn extra(&self) -> Option<&ActivityExtra> {
        match self {
            Self::Transaction(tx) => tx.extra.as_ref(),
            Self::Swap(swap) => swap.extra.as_ref(),
        }
    }

    /// Whether the activity was submitted through the gasless relay.
    pub fn is_gasless(&self) -> bool {
        self.extra().and_then(|e| e.with_w5_gasless) == Some(true)
    }

    pub fn status(&self) -> ActivityStatus {
        match self {
            Self::Transaction(tx) => tx.status,
            Self::Swap(swap) => swap.status,
        }
    }

    pub fn set_status(&mut self, status: ActivityStatus) {
        match self {
            Self::Transaction(tx) => tx.status = status,
            Self::Swap(swap) => swap.status = status,
        }
    }

    /// Swaps report [`TransactionType::Swap`].
    pub fn tx_type(&self) -> Option<TransactionType> {
        match self {
            Self::Transaction(tx) => tx.tx_type,
            Self::Swap(_) => Some(TransactionType::Swap),
        }
    }

    pub fn is_contract_call(&self) -> bool {
        self.tx_type() == Some(TransactionType::CallContract)
    }

    pub fn is_local(&self) -> bool {
        is_local_id(self.id())
    }

    pub fn is_backend_swap(&self) -> bool {
        is_backend_swap_id(self.id())
    }

    /// Awaiting blockchain confirmation. Backend swaps never count as pending since
    /// they do not originate on a chain.
    pub fn is_pending(&self) -> bool {
        match self {
            Self::Transaction(tx) => tx.status.is_pending(),
            Self::Swap(swap) => !is_backend_swap_id(&swap.id) && swap.status.is_pending(),
        }
    }

    pub fn is_scam(&self) -> bool {
        match self {
            Self::Transaction(tx) => {
                tx.metadata.as_ref().and_then(|m| m.is_scam) == Some(true)
            }
            Self::Swap(_) => false,
        }
    }

    /// Token slugs whose history this activity belongs to. NFT transfers belong to
    /// no token history; swaps belong to both sides.
    pub fn token_slugs(&self) -> Vec<&str> {
        match self {
            Self::Transaction(tx) => {
                if tx.nft.is_some() {
                    Vec::new()
                } else {
                    vec![tx.slug.as_str()]
                }
            }
            Self::Swap(swap) => vec![swap.from.as_str(), swap.to.as_str()],
        }
    }

    pub fn parsed_tx_id(&self) -> ParsedTxId {
        parse_tx_id(self.id())
    }
}

impl From<TransactionActivity> for Activity {
    fn from(tx: TransactionActivity) -> Self {
        Self::Transaction(tx)
    }
}

impl From<SwapActivity> for Activity {
    fn from(swap: SwapActivity) -> Self {
        Self::Swap(swap)
    }
}
