//! Total order over activities and the id-list merges built on it.
//!
//! Every timeline is sorted newest to oldest: timestamp descending, then chain
//! logical time descending, then id descending.

use std::cmp::Ordering;
use std::collections::HashSet;

use mtw_types::{Activity, Timestamp};

use crate::ActivityMap;

/// `Less` means `a` sorts before `b`, i.e. `a` is newer.
pub fn compare_activities(a: &Activity, b: &Activity) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| b.lt().cmp(&a.lt()))
        .then_with(|| b.id().cmp(a.id()))
}

/// Compare two ids by the activities they refer to.
///
/// Both ids must be present in `by_id`. A missing id is a logic error: it is logged
/// and asserted in debug builds. Release builds fall back to a total order where
/// known activities come first and unknown ids sort by id descending.
pub fn compare_activity_ids(id_a: &str, id_b: &str, by_id: &ActivityMap) -> Ordering {
    match (by_id.get(id_a), by_id.get(id_b)) {
        (Some(a), Some(b)) => compare_activities(a, b),
        (Some(_), None) => {
            report_missing_id(id_b);
            Ordering::Less
        }
        (None, Some(_)) => {
            report_missing_id(id_a);
            Ordering::Greater
        }
        (None, None) => {
            report_missing_id(id_a);
            id_b.cmp(id_a)
        }
    }
}

fn report_missing_id(id: &str) {
    tracing::error!(id, "activity id is missing from by_id while sorting");
    debug_assert!(false, "activity id {id} is missing from by_id");
}

/// Deduplicate `ids` and sort them newest first.
pub fn sort_activity_ids<I>(ids: I, by_id: &ActivityMap) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let unique: HashSet<String> = ids.into_iter().collect();
    let mut sorted: Vec<String> = unique.into_iter().collect();
    sorted.sort_by(|a, b| compare_activity_ids(a, b, by_id));
    sorted
}

/// Union of both lists, deduplicated by id and sorted newest first.
pub fn merge_sorted_activity_ids(ids_a: &[String], ids_b: &[String], by_id: &ActivityMap) -> Vec<String> {
    sort_activity_ids(ids_a.iter().chain(ids_b).cloned(), by_id)
}

/// Merge used for the initial load, when batches of different chains reach
/// different depths of history.
///
/// Keeps only activities at or after the later of the two lists' oldest
/// timestamps, so the shallower batch cannot leave a silent gap below it.
pub fn merge_activity_ids_to_max_time(ids_a: &[String], ids_b: &[String], by_id: &ActivityMap) -> Vec<String> {
    if ids_a.is_empty() {
        return sort_activity_ids(ids_b.iter().cloned(), by_id);
    }
    if ids_b.is_empty() {
        return sort_activity_ids(ids_a.iter().cloned(), by_id);
    }

    let timestamp_of = |id: &str| {
        by_id
            .get(id)
            .map(Activity::timestamp)
            .unwrap_or(Timestamp::EPOCH)
    };
    let oldest_timestamp = |ids: &[String]| {
        ids.iter()
            .map(|id| timestamp_of(id))
            .min()
            .unwrap_or(Timestamp::EPOCH)
    };
    let from_timestamp = oldest_timestamp(ids_a).max(oldest_timestamp(ids_b));

    let kept = ids_a
        .iter()
        .chain(ids_b)
        .filter(|id| timestamp_of(id) >= from_timestamp)
        .cloned();
    sort_activity_ids(kept, by_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{by_id, ids, tx};
    use mtw_types::TransactionActivity;

    #[test]
    fn newer_timestamp_sorts_first() {
        let a = tx("a", 200);
        let b = tx("b", 100);
        assert_eq!(compare_activities(&a, &b), Ordering::Less);
        assert_eq!(compare_activities(&b, &a), Ordering::Greater);
    }

    #[test]
    fn logical_time_breaks_timestamp_ties() {
        let mut a = tx("a", 100);
        let mut b = tx("b", 100);
        if let Activity::Transaction(TransactionActivity { lt, .. }) = &mut a {
            *lt = Some(5);
        }
        if let Activity::Transaction(TransactionActivity { lt, .. }) = &mut b {
            *lt = Some(9);
        }
        assert_eq!(compare_activities(&b, &a), Ordering::Less);
    }

    #[test]
    fn id_breaks_remaining_ties() {
        let a = tx("a", 100);
        let b = tx("b", 100);
        assert_eq!(compare_activities(&b, &a), Ordering::Less);
        assert_eq!(compare_activities(&a, &a.clone()), Ordering::Equal);
    }

    #[test]
    fn merge_dedupes_and_sorts() {
        let map = by_id(&[tx("a", 1), tx("b", 2), tx("c", 3)]);
        let merged = merge_sorted_activity_ids(&ids(&["a", "c"]), &ids(&["c", "b", "a"]), &map);
        assert_eq!(merged, ids(&["c", "b", "a"]));
    }

    #[test]
    fn merge_with_self_is_sorted_dedup() {
        let map = by_id(&[tx("a", 1), tx("b", 2)]);
        let list = ids(&["a", "b", "a"]);
        assert_eq!(merge_sorted_activity_ids(&list, &list, &map), ids(&["b", "a"]));
    }

    #[test]
    fn max_time_merge_drops_older_tail_of_deeper_batch() {
        // Chain A reaches back to 500, chain B only to 900.
        let map = by_id(&[tx("a1", 1000), tx("a2", 700), tx("a3", 500), tx("b1", 900)]);
        let merged = merge_activity_ids_to_max_time(&ids(&["a1", "a2", "a3"]), &ids(&["b1"]), &map);
        assert_eq!(merged, ids(&["a1", "b1"]));
    }

    #[test]
    fn max_time_merge_with_one_empty_side_keeps_everything() {
        let map = by_id(&[tx("a1", 10), tx("a2", 5)]);
        let merged = merge_activity_ids_to_max_time(&ids(&["a2", "a1", "a1"]), &[], &map);
        assert_eq!(merged, ids(&["a1", "a2"]));
        assert!(merge_activity_ids_to_max_time(&[], &[], &map).is_empty());
    }

    #[test]
    fn max_time_merge_keeps_boundary_timestamp() {
        let map = by_id(&[tx("a1", 900), tx("a2", 800), tx("b1", 950), tx("b2", 900)]);
        let merged = merge_activity_ids_to_max_time(&ids(&["a1", "a2"]), &ids(&["b1", "b2"]), &map);
        assert_eq!(merged, ids(&["b1", "b2", "a1"]));
    }
}
