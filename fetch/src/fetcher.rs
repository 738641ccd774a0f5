//! The fetch collaborator consumed by the activity store.

use async_trait::async_trait;

use mtw_types::{AccountId, Activity, Timestamp};

use crate::FetchError;

#[async_trait]
pub trait ActivityFetcher: Send + Sync {
    /// Up to `limit` activities strictly older than `to_timestamp`, newest first,
    /// or the most recent `limit` when no cursor is given. An empty page means the
    /// history has no more entries.
    async fn fetch_past_activities(
        &self,
        account_id: &AccountId,
        limit: usize,
        token_slug: Option<&str>,
        to_timestamp: Option<Timestamp>,
    ) -> Result<Vec<Activity>, FetchError>;

    /// The same activity with its detail fields filled in.
    async fn fetch_activity_details(
        &self,
        account_id: &AccountId,
        activity: &Activity,
    ) -> Result<Activity, FetchError>;
}
