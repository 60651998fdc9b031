// ── Retention cleaner ──

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CleaningConfig;
use crate::store::TrafficStore;

/// Periodically deletes raw rows older than the configured depth.
///
/// Serializes with other writers only through store transactions; it does
/// not take the analyzers' advisory lock.
pub struct DataCleaner {
    store: Arc<TrafficStore>,
    config: CleaningConfig,
}

impl DataCleaner {
    pub fn new(store: Arc<TrafficStore>, config: CleaningConfig) -> Self {
        Self { store, config }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        info!(
            interval_ms = self.config.interval_ms,
            depth_ms = self.config.depth_ms,
            "data cleaner started"
        );
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let cutoff = Utc::now() - chrono::Duration::milliseconds(self.config.depth_ms as i64);
                    match self.store.delete_older_than(cutoff).await {
                        Ok(removed) if removed > 0 => debug!(removed, "retention sweep done"),
                        Ok(_) => {}
                        Err(error) => warn!(%error, "retention sweep failed"),
                    }
                }
            }
        }
        info!("data cleaner stopped");
    }
}
