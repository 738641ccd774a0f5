//! Inbound activity updates and outbound change notifications.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use mtw_reconcile::IdReplacements;
use mtw_types::{AccountId, Activity, Chain};

/// First history batch for an account on one chain. The per-slug lists are
/// authoritative for their slugs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialActivities {
    pub account_id: AccountId,
    #[serde(default)]
    pub chain: Option<Chain>,
    #[serde(default)]
    pub main_activities: Vec<Activity>,
    #[serde(default)]
    pub by_slug: HashMap<String, Vec<Activity>>,
}

/// Newly observed activities. With a chain and a pending list, the pending list
/// replaces everything previously pending on that chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivities {
    pub account_id: AccountId,
    #[serde(default)]
    pub chain: Option<Chain>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub pending_activities: Option<Vec<Activity>>,
}

/// Optimistic activities created by this client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocalActivities {
    pub account_id: AccountId,
    pub activities: Vec<Activity>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityUpdate {
    InitialActivities(InitialActivities),
    NewActivities(NewActivities),
    NewLocalActivities(NewLocalActivities),
}

impl ActivityUpdate {
    pub fn account_id(&self) -> &AccountId {
        match self {
            Self::InitialActivities(u) => &u.account_id,
            Self::NewActivities(u) => &u.account_id,
            Self::NewLocalActivities(u) => &u.account_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitialActivities(_) => "initialActivities",
            Self::NewActivities(_) => "newActivities",
            Self::NewLocalActivities(_) => "newLocalActivities",
        }
    }
}

/// Emitted after every mutation of an account. Empty `updated_ids` and
/// `replaced_ids` ask observers to reload the whole account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesChanged {
    pub account_id: AccountId,
    pub updated_ids: Vec<String>,
    pub replaced_ids: IdReplacements,
}

/// Fan-out of [`ActivitiesChanged`] to any number of observers.
///
/// Slow observers miss notifications (`RecvError::Lagged`) instead of holding
/// back the store.
pub struct ChangeNotifier {
    tx: broadcast::Sender<ActivitiesChanged>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivitiesChanged> {
        self.tx.subscribe()
    }

    pub fn emit(&self, change: ActivitiesChanged) {
        tracing::debug!(
            account = %change.account_id,
            updated = change.updated_ids.len(),
            replaced = change.replaced_ids.len(),
            "activities changed"
        );
        // No subscribers is fine.
        let _ = self.tx.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_updates() {
        let json = r#"{
            "type": "newActivities",
            "accountId": "0-mainnet",
            "chain": "ton",
            "activities": [{
                "kind": "transaction", "id": "c1", "timestamp": 101,
                "amount": "-5", "slug": "toncoin", "isIncoming": false,
                "status": "completed", "externalMsgHashNorm": "h1"
            }],
            "pendingActivities": []
        }"#;
        let update: ActivityUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.kind(), "newActivities");
        assert_eq!(update.account_id().as_str(), "0-mainnet");
        match update {
            ActivityUpdate::NewActivities(u) => {
                assert_eq!(u.chain, Some(Chain::Ton));
                assert_eq!(u.activities[0].external_msg_hash_norm(), Some("h1"));
                assert_eq!(u.pending_activities, Some(Vec::new()));
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn missing_pending_list_stays_none() {
        let json = r#"{"type":"newActivities","accountId":"a","activities":[]}"#;
        match serde_json::from_str::<ActivityUpdate>(json).unwrap() {
            ActivityUpdate::NewActivities(u) => assert_eq!(u.pending_activities, None),
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn change_serializes_camel_case() {
        let change = ActivitiesChanged {
            account_id: AccountId::new("a"),
            updated_ids: vec!["c1".into()],
            replaced_ids: IdReplacements::from([("x:local".to_string(), "c1".to_string())]),
        };
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["accountId"], "a");
        assert_eq!(value["replacedIds"]["x:local"], "c1");
    }

    #[tokio::test]
    async fn notifier_reaches_every_subscriber() {
        let notifier = ChangeNotifier::new(4);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.emit(ActivitiesChanged {
            account_id: AccountId::new("acc"),
            ..Default::default()
        });
        assert_eq!(a.recv().await.unwrap().account_id.as_str(), "acc");
        assert_eq!(b.recv().await.unwrap().account_id.as_str(), "acc");
    }
}
