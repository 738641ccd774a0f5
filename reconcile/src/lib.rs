//! Reconciliation of wallet activity histories.
//!
//! Activities reach an account from several asynchronous sources: optimistic local
//! writes, pending chain state, confirmed chain state, and the swap backend. The
//! functions in this crate are pure. They decide the order of a timeline, whether a
//! newly observed activity confirms a previously known one, which ids replace which,
//! and how per-token timelines are derived. The per-account state store in
//! `mtw-engine` applies their results.

pub mod matching;
pub mod order;
pub mod replacements;
pub mod slugs;

use std::collections::HashMap;

use mtw_types::Activity;

/// Activities of one account keyed by id.
pub type ActivityMap = HashMap<String, Activity>;

/// Previous activity id -> the id that supersedes it.
pub type IdReplacements = HashMap<String, String>;

pub use matching::does_local_activity_match;
pub use order::{
    compare_activities, compare_activity_ids, merge_activity_ids_to_max_time,
    merge_sorted_activity_ids, sort_activity_ids,
};
pub use replacements::{
    get_activity_id_replacements, get_chain_activity_id_replacements,
    get_local_activity_id_replacements, split_replaced_and_new_activities,
};
pub use slugs::{
    activity_list_token_slugs, build_activity_ids_by_slug, newest_activities_by_slug,
    refresh_newest_activities_by_slug,
};

#[cfg(test)]
pub(crate) mod test_support {
    use super::ActivityMap;
    use mtw_types::{Activity, Amount, SwapActivity, Timestamp, TransactionActivity};

    pub fn tx(id: &str, ts: i64) -> Activity {
        Activity::Transaction(TransactionActivity {
            id: id.into(),
            timestamp: Timestamp::new(ts),
            slug: "toncoin".into(),
            amount: Amount::new(-1_000),
            normalized_address: Some("EQdest".into()),
            ..Default::default()
        })
    }

    pub fn tx_with_hash(id: &str, ts: i64, hash: &str) -> Activity {
        let mut activity = tx(id, ts);
        if let Activity::Transaction(t) = &mut activity {
            t.external_msg_hash_norm = Some(hash.into());
        }
        activity
    }

    pub fn tx_on_slug(id: &str, ts: i64, slug: &str) -> Activity {
        let mut activity = tx(id, ts);
        if let Activity::Transaction(t) = &mut activity {
            t.slug = slug.into();
        }
        activity
    }

    pub fn swap(id: &str, ts: i64, from: &str, to: &str) -> Activity {
        Activity::Swap(SwapActivity {
            id: id.into(),
            timestamp: Timestamp::new(ts),
            from: from.into(),
            to: to.into(),
            from_amount: "10".into(),
            to_amount: "25.5".into(),
            ..Default::default()
        })
    }

    pub fn by_id(activities: &[Activity]) -> ActivityMap {
        activities
            .iter()
            .map(|a| (a.id().to_string(), a.clone()))
            .collect()
    }

    pub fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }
}
