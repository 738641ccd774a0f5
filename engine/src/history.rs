//! Pulling older history and activity details through the fetcher.

use tracing::Instrument;

use mtw_reconcile::IdReplacements;
use mtw_types::{is_id_suitable_for_fetching_timestamp, AccountId, Activity, Timestamp};

use crate::state_updater::{merge_past_activities, set_history_end_reached, update_activity_details};
use crate::store::ActivityStore;
use crate::tracing_spans::{details_span, pagination_span};
use crate::EngineError;

impl ActivityStore {
    /// Page backwards through the history of the main timeline (`slug = None`)
    /// or of one token, until `limit` visible activities were loaded or the
    /// history ends. Returns the number of visible activities loaded.
    ///
    /// Every page is merged as its own transaction, so pages loaded before a
    /// fetch error are kept. With `with_budget`, one more batch is loaded after
    /// yielding to the runtime.
    pub async fn load_past_activities(
        &self,
        account_id: &AccountId,
        slug: Option<&str>,
        limit: usize,
        with_budget: bool,
    ) -> Result<usize, EngineError> {
        let span = pagination_span(account_id.as_str(), slug, limit);
        async {
            let mut loaded = self.load_batch(account_id, slug, limit).await?;
            if with_budget && !self.account_state(account_id).await.is_history_end_reached(slug) {
                tokio::task::yield_now().await;
                loaded += self.load_batch(account_id, slug, limit).await?;
            }
            Ok(loaded)
        }
        .instrument(span)
        .await
    }

    async fn load_batch(&self, account_id: &AccountId, slug: Option<&str>, limit: usize) -> Result<usize, EngineError> {
        if limit == 0 {
            return Ok(0);
        }

        let mut cursor = {
            let state = self.account_state(account_id).await;
            match slug {
                None => state.last_main_timestamp(),
                Some(slug) => state.last_slug_timestamp(slug),
            }
        };
        let mut visible = 0;

        loop {
            let page = self
                .fetcher
                .fetch_past_activities(account_id, limit, slug, cursor)
                .await?;
            self.metrics.pagination_pages.inc();

            if page.is_empty() {
                self.with_account_state(account_id, |state| {
                    set_history_end_reached(state, slug, true);
                })
                .await;
                tracing::debug!(account = %account_id, slug, visible, "history end reached");
                self.notify(account_id, Vec::new(), IdReplacements::new());
                break;
            }

            let page_visible = if self.config.hide_scam_transfers {
                page.iter().filter(|a| !a.is_scam()).count()
            } else {
                page.len()
            };
            let page_cursor = oldest_suitable_timestamp(&page);

            let added = self
                .with_account_state(account_id, |state| merge_past_activities(state, slug, page))
                .await;
            self.metrics.activities_inserted.inc_by(added.len() as u64);
            self.notify(account_id, Vec::new(), IdReplacements::new());

            visible += page_visible;
            tracing::debug!(account = %account_id, slug, added = added.len(), visible, "history page merged");
            if visible >= limit {
                break;
            }

            match (page_cursor, cursor) {
                (Some(next), Some(previous)) if next >= previous => {
                    tracing::warn!(account = %account_id, slug, "history page did not advance the cursor");
                    break;
                }
                (None, _) => break,
                (next, _) => cursor = next,
            }
        }

        Ok(visible)
    }

    /// Fetch the detailed version of `activity` and store it.
    pub async fn fetch_activity_details(
        &self,
        account_id: &AccountId,
        activity: &Activity,
    ) -> Result<Activity, EngineError> {
        let span = details_span(account_id.as_str(), activity.id());
        async {
            let detailed = self.fetcher.fetch_activity_details(account_id, activity).await?;
            let stored = {
                let detailed = detailed.clone();
                self.with_account_state(account_id, |state| update_activity_details(state, detailed))
                    .await
            };
            if !stored {
                tracing::debug!(account = %account_id, id = detailed.id(), "details write skipped");
            }
            self.notify(account_id, vec![detailed.id().to_string()], IdReplacements::new());
            Ok(detailed)
        }
        .instrument(span)
        .await
    }
}

fn oldest_suitable_timestamp(page: &[Activity]) -> Option<Timestamp> {
    page.iter()
        .filter(|a| is_id_suitable_for_fetching_timestamp(a.id()))
        .map(Activity::timestamp)
        .min()
}
