//! Nullable fetcher: serves scripted history pages without a bridge.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use mtw_fetch::{ActivityFetcher, FetchError};
use mtw_types::{AccountId, Activity, Timestamp};

/// One recorded `fetch_past_activities` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchCall {
    pub account_id: AccountId,
    pub limit: usize,
    pub token_slug: Option<String>,
    pub to_timestamp: Option<Timestamp>,
}

enum Page {
    Activities(Vec<Activity>),
    Error(String),
}

/// A fetcher that answers from a queue of scripted pages.
///
/// Pages are consumed in order; once the queue is empty every call returns an
/// empty page, which callers read as the end of history.
#[derive(Default)]
pub struct NullFetcher {
    pages: Mutex<VecDeque<Page>>,
    calls: Mutex<Vec<FetchCall>>,
    details: Mutex<HashMap<String, Activity>>,
}

impl NullFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next page of past activities.
    pub fn push_page(&self, activities: Vec<Activity>) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Page::Activities(activities));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Page::Error(message.into()));
    }

    /// Detailed version returned by `fetch_activity_details` for `activity.id()`.
    pub fn set_details(&self, activity: Activity) {
        self.details
            .lock()
            .unwrap()
            .insert(activity.id().to_string(), activity);
    }

    /// Every past-activities call made so far (for assertions).
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityFetcher for NullFetcher {
    async fn fetch_past_activities(
        &self,
        account_id: &AccountId,
        limit: usize,
        token_slug: Option<&str>,
        to_timestamp: Option<Timestamp>,
    ) -> Result<Vec<Activity>, FetchError> {
        self.calls.lock().unwrap().push(FetchCall {
            account_id: account_id.clone(),
            limit,
            token_slug: token_slug.map(str::to_string),
            to_timestamp,
        });
        match self.pages.lock().unwrap().pop_front() {
            Some(Page::Activities(activities)) => Ok(activities),
            Some(Page::Error(message)) => Err(FetchError::Transport(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_activity_details(
        &self,
        _account_id: &AccountId,
        activity: &Activity,
    ) -> Result<Activity, FetchError> {
        self.details
            .lock()
            .unwrap()
            .get(activity.id())
            .cloned()
            .ok_or_else(|| FetchError::Remote(format!("no details for {}", activity.id())))
    }
}
