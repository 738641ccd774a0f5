//! Ordered background persistence of account states.
//!
//! Mutations publish their new state in memory first and then enqueue a job
//! here. A single worker drains the queue in order, so an older snapshot of an
//! account can never overwrite a newer one on disk. Failures are logged and
//! dropped: the in-memory state stays authoritative for the session.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use mtw_store::{AccountState, ActivityStateStore, StoreError};
use mtw_types::AccountId;

use crate::metrics::EngineMetrics;
use crate::tracing_spans::persist_span;
use crate::EngineError;

enum PersistJob {
    Save(Arc<AccountState>),
    Delete(AccountId),
    DeleteAll,
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<PersistJob>,
}

impl Persister {
    /// Start the worker. It stops once every `Persister` handle is dropped.
    pub fn spawn(store: Arc<dyn ActivityStateStore>, metrics: Arc<EngineMetrics>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(rx, store, metrics));
        (Self { tx }, handle)
    }

    pub fn save(&self, state: Arc<AccountState>) {
        self.enqueue(PersistJob::Save(state));
    }

    pub fn delete(&self, account_id: AccountId) {
        self.enqueue(PersistJob::Delete(account_id));
    }

    pub fn delete_all(&self) {
        self.enqueue(PersistJob::DeleteAll);
    }

    /// Wait until every job queued before this call has been attempted.
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(PersistJob::Flush(done_tx))
            .map_err(|_| EngineError::PersisterClosed)?;
        done_rx.await.map_err(|_| EngineError::PersisterClosed)
    }

    fn enqueue(&self, job: PersistJob) {
        if self.tx.send(job).is_err() {
            tracing::error!("persistence worker is gone, dropping write");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<PersistJob>,
    store: Arc<dyn ActivityStateStore>,
    metrics: Arc<EngineMetrics>,
) {
    while let Some(job) = rx.recv().await {
        let label = match &job {
            PersistJob::Flush(_) => None,
            PersistJob::Save(state) => Some(state.account_id.to_string()),
            PersistJob::Delete(account_id) => Some(account_id.to_string()),
            PersistJob::DeleteAll => Some("*".to_string()),
        };
        let Some(label) = label else {
            if let PersistJob::Flush(done) = job {
                let _ = done.send(());
            }
            continue;
        };

        let store = Arc::clone(&store);
        let span = persist_span(&label);
        let result = tokio::task::spawn_blocking(move || apply(store.as_ref(), job))
            .instrument(span)
            .await;
        match result {
            Ok(Ok(())) => tracing::trace!(account = %label, "persisted"),
            Ok(Err(e)) => {
                metrics.persistence_failures.inc();
                tracing::error!(account = %label, error = %e, "save error");
            }
            Err(e) => {
                metrics.persistence_failures.inc();
                tracing::error!(account = %label, error = %e, "persistence task panicked");
            }
        }
    }
    tracing::debug!("persistence worker stopped");
}

fn apply(store: &dyn ActivityStateStore, job: PersistJob) -> Result<(), StoreError> {
    match job {
        PersistJob::Save(state) => store.upsert(&state),
        PersistJob::Delete(account_id) => store.delete(&account_id),
        PersistJob::DeleteAll => store.delete_all(),
        PersistJob::Flush(done) => {
            let _ = done.send(());
            Ok(())
        }
    }
}
