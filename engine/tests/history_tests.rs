//! Backward pagination and details loading through a scripted fetcher.

use std::sync::Arc;

use mtw_engine::{ActivityStore, EngineConfig, EngineError, EngineMetrics, NewActivities};
use mtw_nullables::{NullFetcher, NullStateStore};
use mtw_types::{
    AccountId, Activity, ActivityStatus, AddressMetadata, Amount, Timestamp, TransactionActivity,
};

fn account() -> AccountId {
    AccountId::new("EQaccount")
}

fn tx(id: &str, ts: i64) -> Activity {
    Activity::Transaction(TransactionActivity {
        id: id.into(),
        timestamp: Timestamp::new(ts),
        slug: "toncoin".into(),
        amount: Amount::new(1_000),
        is_incoming: true,
        status: ActivityStatus::Completed,
        ..Default::default()
    })
}

fn scam(id: &str, ts: i64) -> Activity {
    let mut activity = tx(id, ts);
    if let Activity::Transaction(t) = &mut activity {
        t.metadata = Some(AddressMetadata {
            is_scam: Some(true),
            ..Default::default()
        });
    }
    activity
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn store_with(fetcher: Arc<NullFetcher>, newest: Vec<Activity>) -> ActivityStore {
    let store = ActivityStore::open(
        EngineConfig::default(),
        Arc::new(NullStateStore::new()),
        fetcher,
        Arc::new(EngineMetrics::new()),
    )
    .await;
    store
        .handle_new_activities(NewActivities {
            account_id: account(),
            chain: None,
            activities: newest,
            pending_activities: None,
        })
        .await;
    store
}

#[tokio::test]
async fn pages_until_limit_is_reached() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c4", 400), tx("c3", 300)]);
    fetcher.push_page(vec![tx("c2", 200)]);
    fetcher.push_page(vec![tx("c1", 100)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    let loaded = store.load_past_activities(&account(), None, 3, false).await.unwrap();
    assert_eq!(loaded, 3);

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].to_timestamp, Some(Timestamp::new(500)));
    assert_eq!(calls[1].to_timestamp, Some(Timestamp::new(300)));
    assert!(calls.iter().all(|c| c.limit == 3 && c.token_slug.is_none()));

    let state = store.account_state(&account()).await;
    assert_eq!(state.ids_main, Some(ids(&["c5", "c4", "c3", "c2"])));
    assert!(!state.is_history_end_reached(None));
    assert_eq!(store.metrics().pagination_pages.get(), 2);
    assert!(state.invariant_violations().is_empty());
}

#[tokio::test]
async fn empty_page_marks_history_end() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c4", 400)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;
    let mut rx = store.subscribe();

    let loaded = store.load_past_activities(&account(), None, 10, false).await.unwrap();
    assert_eq!(loaded, 1);
    assert!(store.account_state(&account()).await.is_history_end_reached(None));

    for _ in 0..2 {
        let change = rx.recv().await.unwrap();
        assert!(change.updated_ids.is_empty());
        assert!(change.replaced_ids.is_empty());
    }
}

#[tokio::test]
async fn fetch_error_keeps_merged_pages() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c4", 400)]);
    fetcher.push_error("connection reset");
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    let result = store.load_past_activities(&account(), None, 10, false).await;
    assert!(matches!(result, Err(EngineError::Fetch(_))));

    let state = store.account_state(&account()).await;
    assert_eq!(state.ids_main, Some(ids(&["c5", "c4"])));
    assert!(!state.is_history_end_reached(None));
}

#[tokio::test]
async fn scam_transfers_do_not_count_towards_limit() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![scam("s4", 400), tx("c3", 300)]);
    fetcher.push_page(vec![tx("c2", 200)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    let loaded = store.load_past_activities(&account(), None, 2, false).await.unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(
        store.account_state(&account()).await.ids_main,
        Some(ids(&["c5", "s4", "c3", "c2"]))
    );
}

#[tokio::test]
async fn budget_loads_one_more_batch() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c4", 400)]);
    fetcher.push_page(vec![tx("c3", 300)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    let loaded = store.load_past_activities(&account(), None, 1, true).await.unwrap();
    assert_eq!(loaded, 2);
    let calls = fetcher.calls();
    assert_eq!(calls[1].to_timestamp, Some(Timestamp::new(400)));
}

#[tokio::test]
async fn token_history_pages_its_own_timeline() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c2", 200)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    store
        .load_past_activities(&account(), Some("toncoin"), 1, false)
        .await
        .unwrap();

    let state = store.account_state(&account()).await;
    assert_eq!(state.ids_for_slug("toncoin"), ids(&["c5", "c2"]));
    assert_eq!(state.ids_main, Some(ids(&["c5"])));
    assert_eq!(fetcher.calls()[0].token_slug.as_deref(), Some("toncoin"));
}

#[tokio::test]
async fn first_page_without_cursor() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c1", 100)]);
    let store = store_with(fetcher.clone(), vec![]).await;

    store.load_past_activities(&account(), None, 1, false).await.unwrap();
    assert_eq!(fetcher.calls()[0].to_timestamp, None);
}

#[tokio::test]
async fn zero_limit_fetches_nothing() {
    let fetcher = Arc::new(NullFetcher::new());
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;
    assert_eq!(store.load_past_activities(&account(), None, 0, false).await.unwrap(), 0);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn stalled_cursor_stops_paging() {
    let fetcher = Arc::new(NullFetcher::new());
    fetcher.push_page(vec![tx("c5", 500)]);
    fetcher.push_page(vec![tx("c5", 500)]);
    let store = store_with(fetcher.clone(), vec![tx("c5", 500)]).await;

    let loaded = store.load_past_activities(&account(), None, 5, false).await.unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn details_replace_the_summary() {
    let fetcher = Arc::new(NullFetcher::new());
    let summary = tx("c5", 500);
    let mut detailed = summary.clone();
    if let Activity::Transaction(t) = &mut detailed {
        t.comment = Some("invoice 42".into());
    }
    fetcher.set_details(detailed.clone());
    let store = store_with(fetcher, vec![summary.clone()]).await;
    let mut rx = store.subscribe();

    let returned = store.fetch_activity_details(&account(), &summary).await.unwrap();
    assert_eq!(returned, detailed);
    assert_eq!(store.activity(&account(), "c5").await, Some(detailed.clone()));
    assert_eq!(
        store.account_state(&account()).await.newest_activities_by_slug["toncoin"],
        detailed
    );
    assert_eq!(rx.recv().await.unwrap().updated_ids, ids(&["c5"]));
}

#[tokio::test]
async fn details_error_leaves_state_alone() {
    let fetcher = Arc::new(NullFetcher::new());
    let summary = tx("c5", 500);
    let store = store_with(fetcher, vec![summary.clone()]).await;

    let result = store.fetch_activity_details(&account(), &summary).await;
    assert!(matches!(result, Err(EngineError::Fetch(_))));
    assert_eq!(store.activity(&account(), "c5").await, Some(summary));
}
