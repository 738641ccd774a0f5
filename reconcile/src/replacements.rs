//! Id replacement maps between a previous and a next set of activities.

use std::collections::{HashMap, HashSet, VecDeque};

use mtw_types::Activity;

use crate::matching::does_local_activity_match;
use crate::IdReplacements;

/// Map each previous activity id to the id that supersedes it in `next`.
///
/// Local activities are replaced by their own id when it reappears, else by the
/// first non-local activity of `next` that confirms them. Chain activities are
/// replaced by their own id, else by an activity of `next` that shares their
/// normalized external message hash. Each hash candidate is assigned at most once,
/// in the order the previous activities are given.
pub fn get_activity_id_replacements(prev: &[Activity], next: &[Activity]) -> IdReplacements {
    let (local, chain): (Vec<&Activity>, Vec<&Activity>) = prev.iter().partition(|a| a.is_local());

    let mut replacements = get_local_activity_id_replacements(&local, next);
    replacements.extend(get_chain_activity_id_replacements(&chain, next));
    replacements
}

pub fn get_local_activity_id_replacements(local: &[&Activity], next: &[Activity]) -> IdReplacements {
    if local.is_empty() {
        return IdReplacements::new();
    }
    let next_ids: HashSet<&str> = next.iter().map(Activity::id).collect();

    local
        .iter()
        .filter_map(|prev| {
            if next_ids.contains(prev.id()) {
                return Some((prev.id().to_string(), prev.id().to_string()));
            }
            next.iter()
                .filter(|candidate| !candidate.is_local())
                .find(|candidate| does_local_activity_match(prev, candidate))
                .map(|candidate| (prev.id().to_string(), candidate.id().to_string()))
        })
        .collect()
}

pub fn get_chain_activity_id_replacements(chain: &[&Activity], next: &[Activity]) -> IdReplacements {
    if chain.is_empty() {
        return IdReplacements::new();
    }
    let next_ids: HashSet<&str> = next.iter().map(Activity::id).collect();

    let mut by_hash: HashMap<&str, VecDeque<&str>> = HashMap::new();
    for activity in next {
        if let Some(hash) = activity.external_msg_hash_norm() {
            by_hash.entry(hash).or_default().push_back(activity.id());
        }
    }

    let mut replacements = IdReplacements::new();
    for prev in chain {
        if next_ids.contains(prev.id()) {
            replacements.insert(prev.id().to_string(), prev.id().to_string());
            continue;
        }
        let candidate = prev
            .external_msg_hash_norm()
            .and_then(|hash| by_hash.get_mut(hash))
            .and_then(VecDeque::pop_front);
        if let Some(candidate) = candidate {
            replacements.insert(prev.id().to_string(), candidate.to_string());
        }
    }
    replacements
}

/// Split `incoming` into confirmations of `locals` and genuinely new activities.
///
/// Returns the replacements for the locals that were confirmed together with the
/// incoming activities that confirmed none of them.
pub fn split_replaced_and_new_activities(
    locals: &[Activity],
    incoming: &[Activity],
) -> (IdReplacements, Vec<Activity>) {
    let replacements = get_activity_id_replacements(locals, incoming);
    let replacing: HashSet<&str> = replacements.values().map(String::as_str).collect();
    let new_activities = incoming
        .iter()
        .filter(|a| !replacing.contains(a.id()))
        .cloned()
        .collect();
    (replacements, new_activities)
}
