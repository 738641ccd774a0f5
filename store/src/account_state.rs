//! The per-account activity aggregate.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use mtw_reconcile::{compare_activity_ids, ActivityMap};
use mtw_types::{is_id_suitable_for_fetching_timestamp, AccountId, Activity, Chain, Timestamp};

/// Everything known about one account's history.
///
/// Values are treated as immutable once published: the engine clones a state,
/// applies a whole transaction to the clone, then swaps it in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountState {
    pub account_id: AccountId,
    pub by_id: ActivityMap,
    /// Cross-token timeline, newest first. `None` until the first load, which is
    /// not the same as a loaded empty history.
    pub ids_main: Option<Vec<String>>,
    pub ids_by_slug: HashMap<String, Vec<String>>,
    /// Newest chain-suitable activity per slug.
    pub newest_activities_by_slug: HashMap<String, Activity>,
    pub is_main_history_end_reached: bool,
    pub is_history_end_reached_by_slug: HashMap<String, bool>,
    pub local_activity_ids: BTreeSet<String>,
    pub pending_activity_ids: BTreeMap<Chain, BTreeSet<String>>,
    pub is_initial_loaded_by_chain: BTreeMap<Chain, bool>,
}

impl AccountState {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            ..Default::default()
        }
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.by_id.get(id)
    }

    pub fn ids_main(&self) -> &[String] {
        self.ids_main.as_deref().unwrap_or_default()
    }

    pub fn ids_for_slug(&self, slug: &str) -> &[String] {
        self.ids_by_slug.get(slug).map(Vec::as_slice).unwrap_or_default()
    }

    /// Optimistic activities still present in `by_id`.
    pub fn local_activities(&self) -> Vec<Activity> {
        self.local_activity_ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    pub fn pending_ids(&self, chain: Chain) -> Vec<String> {
        self.pending_activity_ids
            .get(&chain)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Activities currently tracked as pending on `chain`.
    pub fn pending_activities(&self, chain: Chain) -> Vec<Activity> {
        self.pending_activity_ids
            .get(&chain)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    /// Up to `count` of the newest non-local activities of the main timeline.
    pub fn recent_non_local_activities(&self, count: usize) -> Vec<&Activity> {
        self.ids_main()
            .iter()
            .filter(|id| !mtw_types::is_local_id(id))
            .filter_map(|id| self.by_id.get(id))
            .take(count)
            .collect()
    }

    /// Timestamp of the oldest chain-suitable activity of the main timeline, used
    /// as the pagination cursor.
    pub fn last_main_timestamp(&self) -> Option<Timestamp> {
        self.last_chain_timestamp(self.ids_main())
    }

    pub fn last_slug_timestamp(&self, slug: &str) -> Option<Timestamp> {
        self.last_chain_timestamp(self.ids_for_slug(slug))
    }

    fn last_chain_timestamp(&self, ids: &[String]) -> Option<Timestamp> {
        ids.iter()
            .rev()
            .filter(|id| is_id_suitable_for_fetching_timestamp(id))
            .find_map(|id| self.by_id.get(id))
            .map(Activity::timestamp)
    }

    pub fn newest_activity_timestamps(&self) -> HashMap<String, Timestamp> {
        self.newest_activities_by_slug
            .iter()
            .map(|(slug, activity)| (slug.clone(), activity.timestamp()))
            .collect()
    }

    pub fn is_initial_loaded(&self, chain: Chain) -> bool {
        self.is_initial_loaded_by_chain.get(&chain).copied().unwrap_or(false)
    }

    pub fn is_history_end_reached(&self, slug: Option<&str>) -> bool {
        match slug {
            None => self.is_main_history_end_reached,
            Some(slug) => self
                .is_history_end_reached_by_slug
                .get(slug)
                .copied()
                .unwrap_or(false),
        }
    }

    /// Human-readable descriptions of every broken index invariant. Empty for a
    /// consistent state.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if let Some(ids_main) = &self.ids_main {
            self.check_timeline("idsMain", ids_main, &mut violations);
        }
        let mut slugs: Vec<&String> = self.ids_by_slug.keys().collect();
        slugs.sort();
        for slug in slugs {
            self.check_timeline(&format!("idsBySlug[{slug}]"), &self.ids_by_slug[slug], &mut violations);
        }

        for id in &self.local_activity_ids {
            if !self.by_id.contains_key(id) {
                violations.push(format!("local id {id} is missing from byId"));
            }
        }
        for (chain, ids) in &self.pending_activity_ids {
            for id in ids {
                if !self.by_id.contains_key(id) {
                    violations.push(format!("pending id {id} on {chain} is missing from byId"));
                }
            }
        }

        let mut cached: Vec<&String> = self.newest_activities_by_slug.keys().collect();
        cached.sort();
        for slug in cached {
            let expected = self
                .ids_for_slug(slug)
                .iter()
                .filter(|id| is_id_suitable_for_fetching_timestamp(id))
                .find_map(|id| self.by_id.get(id));
            if expected != self.newest_activities_by_slug.get(slug) {
                violations.push(format!("newest activity cached for {slug} is stale"));
            }
        }

        violations
    }

    fn check_timeline(&self, name: &str, ids: &[String], violations: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            if !self.by_id.contains_key(id) {
                violations.push(format!("{name} contains {id} which is missing from byId"));
            }
            if !seen.insert(id) {
                violations.push(format!("{name} contains {id} more than once"));
            }
        }
        for pair in ids.windows(2) {
            let both_known = self.by_id.contains_key(&pair[0]) && self.by_id.contains_key(&pair[1]);
            if both_known && compare_activity_ids(&pair[0], &pair[1], &self.by_id).is_gt() {
                violations.push(format!("{name} orders {} before {}", pair[0], pair[1]));
            }
        }
    }
}
