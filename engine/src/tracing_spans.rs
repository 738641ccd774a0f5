//! Pre-built [`tracing::Span`] constructors for common engine operations.
//!
//! Consistent span names and field sets make traces easy to filter and
//! correlate across accounts.

use tracing::{info_span, Span};

/// Span covering the handling of one inbound activity update.
pub fn update_span(kind: &str, account: &str) -> Span {
    info_span!("activity_update", kind = %kind, account = %account)
}

/// Span covering one backward pagination run.
pub fn pagination_span(account: &str, slug: Option<&str>, limit: usize) -> Span {
    info_span!("load_past_activities", account = %account, slug = slug.unwrap_or("*"), limit)
}

/// Span covering a details fetch for a single activity.
pub fn details_span(account: &str, activity_id: &str) -> Span {
    info_span!("activity_details", account = %account, id = %activity_id)
}

/// Span covering a durable write of one account.
pub fn persist_span(account: &str) -> Span {
    info_span!("persist", account = %account)
}
