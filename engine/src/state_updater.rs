//! Transactional updates of one [`AccountState`].
//!
//! Every function here mutates a private copy of the state owned by the
//! running transaction; the store publishes the copy once the whole update
//! has been applied.

use std::collections::{HashMap, HashSet};

use mtw_reconcile::{
    activity_list_token_slugs, build_activity_ids_by_slug, compare_activities,
    does_local_activity_match, merge_activity_ids_to_max_time, merge_sorted_activity_ids,
    refresh_newest_activities_by_slug, sort_activity_ids, ActivityMap, IdReplacements,
};
use mtw_store::AccountState;
use mtw_types::{Activity, ActivityStatus, Chain};

/// Write `activity` into `by_id`. An existing contract-call record is never
/// overwritten by another copy of itself.
pub fn put_activity(by_id: &mut ActivityMap, activity: Activity) -> bool {
    if activity.is_contract_call() && by_id.contains_key(activity.id()) {
        return false;
    }
    by_id.insert(activity.id().to_string(), activity);
    true
}

/// Insert the first history batch of a chain.
///
/// The main timeline is merged down to the oldest timestamp both sides reach.
/// Slug timelines in `by_slug` replace the stored ones outright.
pub fn add_initial_activities(
    state: &mut AccountState,
    main_activities: &[Activity],
    by_slug: &HashMap<String, Vec<Activity>>,
) -> usize {
    let mut inserted = 0;
    for activity in main_activities.iter().chain(by_slug.values().flatten()) {
        if put_activity(&mut state.by_id, activity.clone()) {
            inserted += 1;
        }
    }

    let main_ids: Vec<String> = main_activities.iter().map(|a| a.id().to_string()).collect();
    state.ids_main = Some(merge_activity_ids_to_max_time(
        &main_ids,
        state.ids_main(),
        &state.by_id,
    ));

    for (slug, activities) in by_slug {
        let ids = sort_activity_ids(activities.iter().map(|a| a.id().to_string()), &state.by_id);
        state.ids_by_slug.insert(slug.clone(), ids);
    }
    let mut touched: HashSet<String> = by_slug.keys().cloned().collect();
    touched.extend(batch_token_slugs(main_activities));
    refresh_newest_activities_by_slug(
        &mut state.newest_activities_by_slug,
        &state.by_id,
        &state.ids_by_slug,
        &touched,
    );
    inserted
}

fn batch_token_slugs(activities: &[Activity]) -> HashSet<String> {
    activities
        .iter()
        .flat_map(Activity::token_slugs)
        .map(str::to_string)
        .collect()
}

/// Insert newly created activities into every timeline they belong to.
///
/// With `chain`, the batch is that chain's complete pending set: the ids of its
/// pending non-local members replace whatever was tracked as pending before.
pub fn add_new_activities(state: &mut AccountState, activities: &[Activity], chain: Option<Chain>) -> usize {
    if let Some(chain) = chain {
        let pending = activities
            .iter()
            .filter(|a| a.is_pending() && !a.is_local())
            .map(|a| a.id().to_string())
            .collect();
        state.pending_activity_ids.insert(chain, pending);
    }
    if activities.is_empty() {
        return 0;
    }

    let mut inserted = 0;
    for activity in activities {
        if put_activity(&mut state.by_id, activity.clone()) {
            inserted += 1;
        }
    }

    let new_ids: Vec<String> = activities.iter().map(|a| a.id().to_string()).collect();
    state.ids_main = Some(merge_sorted_activity_ids(&new_ids, state.ids_main(), &state.by_id));

    let new_ids_by_slug = build_activity_ids_by_slug(activities);
    for (slug, ids) in &new_ids_by_slug {
        let merged = merge_sorted_activity_ids(ids, state.ids_for_slug(slug), &state.by_id);
        state.ids_by_slug.insert(slug.clone(), merged);
    }
    refresh_newest_activities_by_slug(
        &mut state.newest_activities_by_slug,
        &state.by_id,
        &state.ids_by_slug,
        new_ids_by_slug.keys(),
    );

    state.local_activity_ids.extend(
        activities
            .iter()
            .filter(|a| a.is_local())
            .map(|a| a.id().to_string()),
    );
    inserted
}

/// Remove the given ids from every index. Returns how many activities were
/// actually known.
pub fn remove_activities<'a, I>(state: &mut AccountState, ids: I) -> usize
where
    I: IntoIterator<Item = &'a String>,
{
    let delete: HashSet<&String> = ids.into_iter().collect();
    if delete.is_empty() {
        return 0;
    }

    let affected_slugs = activity_list_token_slugs(delete.iter().copied(), &state.by_id);
    for slug in &affected_slugs {
        if let Some(ids) = state.ids_by_slug.get_mut(slug) {
            ids.retain(|id| !delete.contains(id));
        }
    }

    if let Some(ids_main) = state.ids_main.as_mut() {
        ids_main.retain(|id| !delete.contains(id));
    }
    let before = state.by_id.len();
    state.by_id.retain(|id, _| !delete.contains(id));
    let removed = before - state.by_id.len();

    state.local_activity_ids.retain(|id| !delete.contains(id));
    for pending in state.pending_activity_ids.values_mut() {
        pending.retain(|id| !delete.contains(id));
    }

    refresh_newest_activities_by_slug(
        &mut state.newest_activities_by_slug,
        &state.by_id,
        &state.ids_by_slug,
        &affected_slugs,
    );
    removed
}

/// Outcome of [`hide_outdated_local_activities`].
#[derive(Debug, Default)]
pub struct HiddenLocals {
    pub activities: Vec<Activity>,
    pub hidden: usize,
    /// Chain activities upgraded to `pendingTrusted` by a trusted local twin.
    pub upgraded_ids: Vec<String>,
}

/// Mark incoming local activities as hidden when one of the account's recent
/// chain activities already confirms them.
///
/// The scan covers the newest `activities.len() + extra_depth` non-local
/// activities of the main timeline. A `pending` chain activity matched by a
/// `pendingTrusted` local is upgraded to `pendingTrusted` in place.
pub fn hide_outdated_local_activities(
    state: &mut AccountState,
    activities: Vec<Activity>,
    extra_depth: usize,
) -> HiddenLocals {
    let depth = activities.len() + extra_depth;
    let recent: Vec<Activity> = state
        .recent_non_local_activities(depth)
        .into_iter()
        .cloned()
        .collect();

    let mut outcome = HiddenLocals::default();
    for mut local in activities {
        if !local.should_hide() {
            if let Some(chain_activity) = recent.iter().find(|c| does_local_activity_match(&local, c)) {
                local.set_should_hide(true);
                outcome.hidden += 1;
                if local.status() == ActivityStatus::PendingTrusted
                    && chain_activity.status() == ActivityStatus::Pending
                {
                    if let Some(stored) = state.by_id.get_mut(chain_activity.id()) {
                        stored.set_status(ActivityStatus::PendingTrusted);
                        outcome.upgraded_ids.push(chain_activity.id().to_string());
                    }
                }
            }
        }
        outcome.activities.push(local);
    }

    if !outcome.upgraded_ids.is_empty() {
        let slugs = activity_list_token_slugs(&outcome.upgraded_ids, &state.by_id);
        refresh_newest_activities_by_slug(
            &mut state.newest_activities_by_slug,
            &state.by_id,
            &state.ids_by_slug,
            &slugs,
        );
    }
    outcome
}

/// `pending` activities that replace a `pendingTrusted` predecessor keep the
/// trusted status. Other statuses are left alone.
pub fn inherit_trusted_status(
    pending: &[Activity],
    replacements: &IdReplacements,
    previous: &[Activity],
) -> Vec<Activity> {
    let trusted_replacements: HashSet<&str> = previous
        .iter()
        .filter(|prev| prev.status() == ActivityStatus::PendingTrusted)
        .filter_map(|prev| replacements.get(prev.id()))
        .map(String::as_str)
        .collect();

    pending
        .iter()
        .map(|activity| {
            let mut activity = activity.clone();
            if activity.status() == ActivityStatus::Pending && trusted_replacements.contains(activity.id()) {
                activity.set_status(ActivityStatus::PendingTrusted);
            }
            activity
        })
        .collect()
}

/// Merge a page of older history into the main timeline (`slug = None`) or
/// into one slug's timeline. Returns the ids that were added.
pub fn merge_past_activities(state: &mut AccountState, slug: Option<&str>, mut page: Vec<Activity>) -> Vec<String> {
    page.sort_by(compare_activities);
    let mut touched = batch_token_slugs(&page);

    let mut new_ids = Vec::with_capacity(page.len());
    for activity in page {
        let id = activity.id().to_string();
        if put_activity(&mut state.by_id, activity) {
            new_ids.push(id);
        }
    }

    match slug {
        None => {
            let merged = merge_sorted_activity_ids(state.ids_main(), &new_ids, &state.by_id);
            state.ids_main = Some(merged);
        }
        Some(slug) => {
            let merged = merge_sorted_activity_ids(state.ids_for_slug(slug), &new_ids, &state.by_id);
            state.ids_by_slug.insert(slug.to_string(), merged);
            touched.insert(slug.to_string());
        }
    }
    refresh_newest_activities_by_slug(
        &mut state.newest_activities_by_slug,
        &state.by_id,
        &state.ids_by_slug,
        &touched,
    );
    new_ids
}

/// Store a detailed version of an activity. Returns false when the write was
/// skipped by the contract-call guard.
pub fn update_activity_details(state: &mut AccountState, activity: Activity) -> bool {
    let slugs: Vec<String> = activity.token_slugs().into_iter().map(str::to_string).collect();
    if !put_activity(&mut state.by_id, activity) {
        return false;
    }
    refresh_newest_activities_by_slug(
        &mut state.newest_activities_by_slug,
        &state.by_id,
        &state.ids_by_slug,
        &slugs,
    );
    true
}

pub fn set_initial_loaded(state: &mut AccountState, chain: Chain) {
    state.is_initial_loaded_by_chain.insert(chain, true);
}

pub fn set_history_end_reached(state: &mut AccountState, slug: Option<&str>, is_reached: bool) {
    match slug {
        None => state.is_main_history_end_reached = is_reached,
        Some(slug) => {
            state
                .is_history_end_reached_by_slug
                .insert(slug.to_string(), is_reached);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtw_types::{AccountId, Amount, SwapActivity, Timestamp, TransactionActivity, TransactionType};

    fn tx(id: &str, ts: i64, slug: &str) -> Activity {
        Activity::Transaction(TransactionActivity {
            id: id.into(),
            timestamp: Timestamp::new(ts),
            slug: slug.into(),
            amount: Amount::new(-10),
            normalized_address: Some("EQdest".into()),
            ..Default::default()
        })
    }

    fn with_hash(mut activity: Activity, hash: &str) -> Activity {
        if let Activity::Transaction(t) = &mut activity {
            t.external_msg_hash_norm = Some(hash.into());
        }
        activity
    }

    fn with_status(mut activity: Activity, status: ActivityStatus) -> Activity {
        activity.set_status(status);
        activity
    }

    fn swap(id: &str, ts: i64, from: &str, to: &str) -> Activity {
        Activity::Swap(SwapActivity {
            id: id.into(),
            timestamp: Timestamp::new(ts),
            from: from.into(),
            to: to.into(),
            from_amount: "1".into(),
            ..Default::default()
        })
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn state() -> AccountState {
        AccountState::new(AccountId::new("acc"))
    }

    #[test]
    fn new_activities_land_in_main_and_slug_timelines() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("a", 1, "toncoin"), swap("s", 3, "toncoin", "ton-usdt")], None);
        add_new_activities(&mut state, &[tx("b", 2, "ton-usdt")], None);

        assert_eq!(state.ids_main, Some(ids(&["s", "b", "a"])));
        assert_eq!(state.ids_by_slug["toncoin"], ids(&["s", "a"]));
        assert_eq!(state.ids_by_slug["ton-usdt"], ids(&["s", "b"]));
        assert_eq!(state.newest_activities_by_slug["ton-usdt"].id(), "s");
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn newest_cache_of_untouched_slug_is_kept() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("b1", 1, "B")], None);
        let before = state.newest_activities_by_slug["B"].clone();
        add_new_activities(&mut state, &[tx("a1", 5, "A")], None);
        assert_eq!(state.newest_activities_by_slug["B"], before);
    }

    #[test]
    fn chain_tag_replaces_pending_set() {
        let mut state = state();
        let p1 = with_status(tx("p1", 1, "toncoin"), ActivityStatus::Pending);
        let p2 = with_status(tx("p2", 2, "toncoin"), ActivityStatus::Pending);
        add_new_activities(&mut state, &[p1, p2], Some(Chain::Ton));
        assert_eq!(state.pending_ids(Chain::Ton), ids(&["p1", "p2"]));

        let p3 = with_status(tx("p3", 3, "toncoin"), ActivityStatus::Pending);
        let confirmed = tx("c", 4, "toncoin");
        add_new_activities(&mut state, &[p3, confirmed], Some(Chain::Ton));
        assert_eq!(state.pending_ids(Chain::Ton), ids(&["p3"]));
    }

    #[test]
    fn local_ids_are_tracked() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("x:local", 1, "toncoin"), tx("c", 2, "toncoin")], None);
        assert_eq!(state.local_activity_ids.iter().cloned().collect::<Vec<_>>(), ids(&["x:local"]));
    }

    #[test]
    fn contract_call_is_not_overwritten() {
        let mut by_id = ActivityMap::new();
        let mut call = tx("cc", 1, "toncoin");
        if let Activity::Transaction(t) = &mut call {
            t.tx_type = Some(TransactionType::CallContract);
            t.comment = Some("first".into());
        }
        assert!(put_activity(&mut by_id, call.clone()));
        let mut again = call.clone();
        if let Activity::Transaction(t) = &mut again {
            t.comment = Some("second".into());
        }
        assert!(!put_activity(&mut by_id, again));
        assert_eq!(by_id["cc"], call);
    }

    #[test]
    fn removal_clears_every_index() {
        let mut state = state();
        let pending = with_status(tx("p", 3, "toncoin"), ActivityStatus::Pending);
        add_new_activities(&mut state, &[pending], Some(Chain::Ton));
        add_new_activities(&mut state, &[tx("x:local", 2, "toncoin"), tx("c", 1, "toncoin")], None);

        let removed = remove_activities(&mut state, &ids(&["p", "x:local", "unknown"]));
        assert_eq!(removed, 2);
        assert_eq!(state.ids_main, Some(ids(&["c"])));
        assert_eq!(state.ids_by_slug["toncoin"], ids(&["c"]));
        assert!(state.local_activity_ids.is_empty());
        assert!(state.pending_ids(Chain::Ton).is_empty());
        assert_eq!(state.newest_activities_by_slug["toncoin"].id(), "c");
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn removing_last_chain_activity_clears_cache() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("c", 1, "A")], None);
        remove_activities(&mut state, &ids(&["c"]));
        assert!(!state.newest_activities_by_slug.contains_key("A"));
        assert_eq!(state.ids_main, Some(Vec::new()));
    }

    #[test]
    fn initial_load_keeps_only_common_depth() {
        let mut state = state();
        let chain_a = vec![tx("a1", 1000, "toncoin"), tx("a2", 700, "toncoin"), tx("a3", 500, "toncoin")];
        add_initial_activities(&mut state, &chain_a, &HashMap::new());
        assert_eq!(state.ids_main, Some(ids(&["a1", "a2", "a3"])));

        let chain_b = vec![tx("b1", 900, "tron-usdt")];
        add_initial_activities(&mut state, &chain_b, &HashMap::new());
        assert_eq!(state.ids_main, Some(ids(&["a1", "b1"])));
    }

    #[test]
    fn initial_slug_lists_replace_stored_ones() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("old", 1, "toncoin")], None);
        let by_slug = HashMap::from([("toncoin".to_string(), vec![tx("n2", 5, "toncoin"), tx("n1", 6, "toncoin")])]);
        add_initial_activities(&mut state, &[], &by_slug);
        assert_eq!(state.ids_by_slug["toncoin"], ids(&["n1", "n2"]));
        assert_eq!(state.newest_activities_by_slug["toncoin"].id(), "n1");
    }

    #[test]
    fn outdated_local_is_hidden_and_trust_is_propagated() {
        let mut state = state();
        let chain = with_status(with_hash(tx("c1", 10, "toncoin"), "h1"), ActivityStatus::Pending);
        add_new_activities(&mut state, &[chain], None);

        let local = with_status(with_hash(tx("l:local", 9, "toncoin"), "h1"), ActivityStatus::PendingTrusted);
        let fresh = with_hash(tx("m:local", 11, "toncoin"), "h2");
        let outcome = hide_outdated_local_activities(&mut state, vec![local, fresh], 20);

        assert_eq!(outcome.hidden, 1);
        assert!(outcome.activities[0].should_hide());
        assert!(!outcome.activities[1].should_hide());
        assert_eq!(outcome.upgraded_ids, ids(&["c1"]));
        assert_eq!(state.by_id["c1"].status(), ActivityStatus::PendingTrusted);
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn hide_scan_depth_is_bounded() {
        let mut state = state();
        let old = with_hash(tx("old", 1, "toncoin"), "h-old");
        let mut newer: Vec<Activity> = (0..21).map(|i| tx(&format!("n{i}"), 100 + i, "toncoin")).collect();
        newer.push(old);
        add_new_activities(&mut state, &newer, None);

        let local = with_hash(tx("l:local", 200, "toncoin"), "h-old");
        let outcome = hide_outdated_local_activities(&mut state, vec![local], 20);
        assert_eq!(outcome.hidden, 0);
    }

    #[test]
    fn trusted_status_follows_replacement() {
        let prev = vec![with_status(tx("p-old", 1, "toncoin"), ActivityStatus::PendingTrusted)];
        let pending = vec![with_status(tx("p-new", 2, "toncoin"), ActivityStatus::Pending)];
        let replacements = IdReplacements::from([("p-old".to_string(), "p-new".to_string())]);
        let adjusted = inherit_trusted_status(&pending, &replacements, &prev);
        assert_eq!(adjusted[0].status(), ActivityStatus::PendingTrusted);

        let untrusted = inherit_trusted_status(&pending, &IdReplacements::new(), &prev);
        assert_eq!(untrusted[0].status(), ActivityStatus::Pending);

        let confirmed = vec![tx("p-new", 2, "toncoin")];
        let kept = inherit_trusted_status(&confirmed, &replacements, &prev);
        assert_eq!(kept[0].status(), ActivityStatus::Completed);
    }

    #[test]
    fn past_pages_extend_the_right_timeline() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("c3", 30, "toncoin")], None);

        let added = merge_past_activities(&mut state, None, vec![tx("c1", 10, "toncoin"), tx("c2", 20, "toncoin")]);
        assert_eq!(added, ids(&["c2", "c1"]));
        assert_eq!(state.ids_main, Some(ids(&["c3", "c2", "c1"])));
        assert_eq!(state.ids_by_slug["toncoin"], ids(&["c3"]));

        merge_past_activities(&mut state, Some("toncoin"), vec![tx("c0", 5, "toncoin")]);
        assert_eq!(state.ids_by_slug["toncoin"], ids(&["c3", "c0"]));
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn details_refresh_newest_cache() {
        let mut state = state();
        add_new_activities(&mut state, &[tx("c", 1, "toncoin")], None);
        let mut detailed = tx("c", 1, "toncoin");
        if let Activity::Transaction(t) = &mut detailed {
            t.comment = Some("thanks".into());
        }
        assert!(update_activity_details(&mut state, detailed.clone()));
        assert_eq!(state.newest_activities_by_slug["toncoin"], detailed);
    }

    #[test]
    fn history_end_flags() {
        let mut state = state();
        set_history_end_reached(&mut state, None, true);
        set_history_end_reached(&mut state, Some("toncoin"), true);
        set_initial_loaded(&mut state, Chain::Tron);
        assert!(state.is_history_end_reached(None));
        assert!(state.is_history_end_reached(Some("toncoin")));
        assert!(!state.is_history_end_reached(Some("ton-usdt")));
        assert!(state.is_initial_loaded(Chain::Tron));
        assert!(!state.is_initial_loaded(Chain::Ton));
    }
}
