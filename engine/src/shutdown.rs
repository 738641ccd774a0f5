//! Stop signal for the update loop.

use tokio::sync::broadcast;

/// Fans one stop signal out to every [`ActivityStore::run`](crate::ActivityStore::run) loop.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            tx: broadcast::channel(1).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Resolve on Ctrl-C (or SIGTERM on unix) and signal every subscriber.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Ctrl-C handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
            _ = terminated() => {}
        }
        tracing::info!("stop signal received");
        self.shutdown();
    }
}

#[cfg(unix)]
async fn terminated() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(_) => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending().await
}
