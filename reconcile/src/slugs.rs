//! Per-token timelines and the newest-activity cache derived from them.

use std::collections::{HashMap, HashSet};

use mtw_types::{is_id_suitable_for_fetching_timestamp, Activity};

use crate::ActivityMap;

/// Group activity ids by token slug, keeping input order within each slug.
pub fn build_activity_ids_by_slug(activities: &[Activity]) -> HashMap<String, Vec<String>> {
    let mut ids_by_slug: HashMap<String, Vec<String>> = HashMap::new();
    for activity in activities {
        for slug in activity.token_slugs() {
            ids_by_slug
                .entry(slug.to_string())
                .or_default()
                .push(activity.id().to_string());
        }
    }
    ids_by_slug
}

/// Slugs touched by the given ids. Ids missing from `by_id` contribute nothing.
pub fn activity_list_token_slugs<'a, I>(ids: I, by_id: &ActivityMap) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    ids.into_iter()
        .filter_map(|id| by_id.get(id))
        .flat_map(|activity| activity.token_slugs().into_iter().map(str::to_string))
        .collect()
}

/// Recompute the newest chain-suitable activity for each slug in `slugs`.
///
/// Entries for other slugs are left as they are.
pub fn refresh_newest_activities_by_slug<'a, I>(
    newest: &mut HashMap<String, Activity>,
    by_id: &ActivityMap,
    ids_by_slug: &HashMap<String, Vec<String>>,
    slugs: I,
) where
    I: IntoIterator<Item = &'a String>,
{
    for slug in slugs {
        let found = ids_by_slug.get(slug).and_then(|ids| {
            ids.iter()
                .filter(|id| is_id_suitable_for_fetching_timestamp(id))
                .find_map(|id| by_id.get(id))
        });
        match found {
            Some(activity) => {
                newest.insert(slug.clone(), activity.clone());
            }
            None => {
                newest.remove(slug);
            }
        }
    }
}

/// Copying form of [`refresh_newest_activities_by_slug`].
pub fn newest_activities_by_slug<'a, I>(
    by_id: &ActivityMap,
    ids_by_slug: &HashMap<String, Vec<String>>,
    previous: &HashMap<String, Activity>,
    slugs: I,
) -> HashMap<String, Activity>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut newest = previous.clone();
    refresh_newest_activities_by_slug(&mut newest, by_id, ids_by_slug, slugs);
    newest
}
