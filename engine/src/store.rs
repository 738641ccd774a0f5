//! The per-account activity store.
//!
//! Readers get the last published `Arc<AccountState>` of an account and never
//! wait for a writer to finish its work. Writers of one account are serialized
//! by a per-account lock; each runs its update against a private copy of the
//! state and publishes the copy as a whole, then queues it for persistence and
//! notifies observers.
//!
//! Every transaction also holds the shared side of the lifecycle lock.
//! Removing accounts takes the exclusive side, so no transaction can publish
//! or persist a copy taken before the removal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::Instrument;

use mtw_fetch::ActivityFetcher;
use mtw_reconcile::{get_activity_id_replacements, IdReplacements};
use mtw_store::{AccountState, ActivityStateStore};
use mtw_types::{AccountId, Activity, Timestamp};

use crate::config::EngineConfig;
use crate::events::{
    ActivitiesChanged, ActivityUpdate, ChangeNotifier, InitialActivities, NewActivities,
    NewLocalActivities,
};
use crate::metrics::EngineMetrics;
use crate::persister::Persister;
use crate::state_updater::{
    add_initial_activities, add_new_activities, hide_outdated_local_activities,
    inherit_trusted_status, remove_activities, set_initial_loaded,
};
use crate::tracing_spans::update_span;
use crate::EngineError;

pub struct ActivityStore {
    pub(crate) config: EngineConfig,
    snapshots: RwLock<HashMap<AccountId, Arc<AccountState>>>,
    lifecycle: RwLock<()>,
    writers: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    notifier: ChangeNotifier,
    persister: Persister,
    pub(crate) fetcher: Arc<dyn ActivityFetcher>,
    pub(crate) metrics: Arc<EngineMetrics>,
}

impl ActivityStore {
    /// Load every persisted account and start the persistence worker.
    ///
    /// A failing initial load is logged and the store starts empty.
    pub async fn open(
        config: EngineConfig,
        state_store: Arc<dyn ActivityStateStore>,
        fetcher: Arc<dyn ActivityFetcher>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let loader = Arc::clone(&state_store);
        let loaded = match tokio::task::spawn_blocking(move || loader.fetch_all()).await {
            Ok(Ok(states)) => states,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "account states initial load failed");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "account states initial load panicked");
                Vec::new()
            }
        };
        tracing::info!(accounts = loaded.len(), "loaded activity states");
        metrics.tracked_accounts.set(loaded.len() as i64);

        let snapshots = loaded
            .into_iter()
            .map(|state| (state.account_id.clone(), Arc::new(state)))
            .collect();
        let (persister, _worker) = Persister::spawn(state_store, Arc::clone(&metrics));

        Self {
            notifier: ChangeNotifier::new(config.notification_capacity),
            config,
            snapshots: RwLock::new(snapshots),
            lifecycle: RwLock::new(()),
            writers: Mutex::new(HashMap::new()),
            persister,
            fetcher,
            metrics,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivitiesChanged> {
        self.notifier.subscribe()
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Last published state of the account, empty if it was never seen.
    pub async fn account_state(&self, account_id: &AccountId) -> Arc<AccountState> {
        self.snapshots
            .read()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(AccountState::new(account_id.clone())))
    }

    pub async fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.snapshots.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn activity(&self, account_id: &AccountId, activity_id: &str) -> Option<Activity> {
        self.account_state(account_id).await.activity(activity_id).cloned()
    }

    pub async fn newest_activity_timestamps(&self, account_id: &AccountId) -> HashMap<String, Timestamp> {
        self.account_state(account_id).await.newest_activity_timestamps()
    }

    // ── Transactions ───────────────────────────────────────────────────

    async fn writer(&self, account_id: &AccountId) -> Arc<Mutex<()>> {
        let mut writers = self.writers.lock().await;
        Arc::clone(writers.entry(account_id.clone()).or_default())
    }

    /// Run `f` against a copy of the account's state and publish the result.
    ///
    /// Transactions of the same account never overlap, so `f` always sees the
    /// state published by the previous one.
    pub(crate) async fn with_account_state<F, R>(&self, account_id: &AccountId, f: F) -> R
    where
        F: FnOnce(&mut AccountState) -> R,
    {
        let _lifecycle = self.lifecycle.read().await;
        let writer = self.writer(account_id).await;
        let _guard = writer.lock().await;

        let started = Instant::now();
        let mut next = (*self.account_state(account_id).await).clone();
        let result = f(&mut next);
        let next = Arc::new(next);

        let tracked = {
            let mut snapshots = self.snapshots.write().await;
            snapshots.insert(account_id.clone(), Arc::clone(&next));
            snapshots.len()
        };
        self.metrics.tracked_accounts.set(tracked as i64);
        self.metrics
            .transaction_time_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        self.persister.save(next);
        result
    }

    pub(crate) fn notify(&self, account_id: &AccountId, updated_ids: Vec<String>, replaced_ids: IdReplacements) {
        self.notifier.emit(ActivitiesChanged {
            account_id: account_id.clone(),
            updated_ids,
            replaced_ids,
        });
    }

    // ── Inbound updates ────────────────────────────────────────────────

    pub async fn handle_update(&self, update: ActivityUpdate) {
        let span = update_span(update.kind(), update.account_id().as_str());
        self.metrics
            .updates_handled
            .with_label_values(&[update.kind()])
            .inc();
        async {
            match update {
                ActivityUpdate::InitialActivities(u) => self.handle_initial_activities(u).await,
                ActivityUpdate::NewActivities(u) => self.handle_new_activities(u).await,
                ActivityUpdate::NewLocalActivities(u) => self.handle_new_local_activities(u).await,
            }
        }
        .instrument(span)
        .await
    }

    pub async fn handle_initial_activities(&self, update: InitialActivities) {
        let InitialActivities {
            account_id,
            chain,
            main_activities,
            by_slug,
        } = update;

        let (inserted, main_len) = self
            .with_account_state(&account_id, |state| {
                let inserted = add_initial_activities(state, &main_activities, &by_slug);
                if let Some(chain) = chain {
                    set_initial_loaded(state, chain);
                }
                (inserted, state.ids_main().len())
            })
            .await;
        self.metrics.activities_inserted.inc_by(inserted as u64);

        tracing::info!(
            account = %account_id,
            chain = ?chain,
            main = main_activities.len(),
            slugs = by_slug.len(),
            main_ids = main_len,
            "initial activities"
        );
        self.notify(&account_id, Vec::new(), IdReplacements::new());
    }

    pub async fn handle_new_activities(&self, update: NewActivities) {
        let NewActivities {
            account_id,
            chain,
            activities,
            pending_activities,
        } = update;

        let (replaced, inserted, removed) = self
            .with_account_state(&account_id, |state| {
                let mut previous = state.local_activities();
                if let Some(chain) = chain {
                    previous.extend(state.pending_activities(chain));
                }
                let incoming: Vec<Activity> = activities
                    .iter()
                    .chain(pending_activities.iter().flatten())
                    .cloned()
                    .collect();
                let replaced = get_activity_id_replacements(&previous, &incoming);

                let mut removed = remove_activities(state, replaced.keys());
                let mut inserted = 0;
                if let (Some(chain), Some(pending)) = (chain, pending_activities.as_deref()) {
                    let old_pending = state.pending_ids(chain);
                    removed += remove_activities(state, &old_pending);
                    let pending = inherit_trusted_status(pending, &replaced, &previous);
                    inserted += add_new_activities(state, &pending, Some(chain));
                }
                let confirmed = inherit_trusted_status(&activities, &replaced, &previous);
                inserted += add_new_activities(state, &confirmed, None);
                if let Some(chain) = chain {
                    set_initial_loaded(state, chain);
                }
                (replaced, inserted, removed)
            })
            .await;

        self.metrics.ids_replaced.inc_by(replaced.len() as u64);
        self.metrics.activities_inserted.inc_by(inserted as u64);
        self.metrics.activities_removed.inc_by(removed as u64);

        let mut updated_ids: Vec<String> = Vec::new();
        for activity in pending_activities.iter().flatten().chain(&activities) {
            if !updated_ids.iter().any(|id| id == activity.id()) {
                updated_ids.push(activity.id().to_string());
            }
        }

        tracing::info!(
            account = %account_id,
            chain = ?chain,
            confirmed = activities.len(),
            pending = pending_activities.as_ref().map(Vec::len),
            replaced = replaced.len(),
            "new activities"
        );
        self.notify(&account_id, updated_ids, replaced);
    }

    pub async fn handle_new_local_activities(&self, update: NewLocalActivities) {
        let NewLocalActivities {
            account_id,
            activities,
        } = update;
        let extra_depth = self.config.hide_outdated_extra_depth;

        let (updated_ids, hidden, inserted) = self
            .with_account_state(&account_id, |state| {
                let outcome = hide_outdated_local_activities(state, activities, extra_depth);
                let inserted = add_new_activities(state, &outcome.activities, None);
                let mut updated_ids: Vec<String> = Vec::new();
                let local_ids = outcome.activities.iter().map(Activity::id);
                for id in local_ids.chain(outcome.upgraded_ids.iter().map(String::as_str)) {
                    if !updated_ids.iter().any(|known| known == id) {
                        updated_ids.push(id.to_string());
                    }
                }
                (updated_ids, outcome.hidden, inserted)
            })
            .await;

        self.metrics.locals_hidden.inc_by(hidden as u64);
        self.metrics.activities_inserted.inc_by(inserted as u64);
        tracing::info!(account = %account_id, count = updated_ids.len(), hidden, "new local activities");
        self.notify(&account_id, updated_ids, IdReplacements::new());
    }

    /// Consume updates until the channel closes or shutdown is signalled.
    pub async fn run(&self, mut updates: mpsc::Receiver<ActivityUpdate>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("activity store stopping");
                    break;
                }
                update = updates.recv() => match update {
                    Some(update) => self.handle_update(update).await,
                    None => {
                        tracing::debug!("update channel closed");
                        break;
                    }
                },
            }
        }
    }

    // ── Account lifecycle ──────────────────────────────────────────────

    /// Drop everything known about an account, in memory and on disk.
    pub async fn remove_account(&self, account_id: &AccountId) {
        let _lifecycle = self.lifecycle.write().await;
        self.writers.lock().await.remove(account_id);

        let tracked = {
            let mut snapshots = self.snapshots.write().await;
            snapshots.remove(account_id);
            snapshots.len()
        };
        self.metrics.tracked_accounts.set(tracked as i64);
        self.persister.delete(account_id.clone());
        tracing::info!(account = %account_id, "account removed");
        self.notify(account_id, Vec::new(), IdReplacements::new());
    }

    /// Drop every account, in memory and on disk.
    pub async fn clean(&self) {
        let _lifecycle = self.lifecycle.write().await;
        self.writers.lock().await.clear();
        self.snapshots.write().await.clear();
        self.metrics.tracked_accounts.set(0);
        self.persister.delete_all();
        tracing::info!("all activity state cleaned");
    }

    /// Wait until every queued durable write has been attempted.
    pub async fn flush(&self) -> Result<(), EngineError> {
        self.persister.flush().await
    }
}
