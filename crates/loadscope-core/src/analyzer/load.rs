// ── Realtime load analyzer ──
//
// Every compute interval: take the advisory store lock, enumerate the
// catalog, and compute the mean smoothed load of the recent window for
// both directions of every class, one task per class. The fan-out is
// joined before the lock is released.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{mean_load, smooth_rows};
use crate::config::AnalyzerConfig;
use crate::display::DisplayBus;
use crate::error::CoreError;
use crate::model::{DataType, Direction, DisplayTemplate};
use crate::smoothing::SmoothingEngine;
use crate::store::TrafficStore;

pub struct LoadAnalyzer {
    store: Arc<TrafficStore>,
    bus: Arc<DisplayBus>,
    smoothing: SmoothingEngine,
    config: AnalyzerConfig,
}

impl LoadAnalyzer {
    pub fn new(store: Arc<TrafficStore>, bus: Arc<DisplayBus>, config: AnalyzerConfig) -> Self {
        Self {
            store,
            bus,
            smoothing: SmoothingEngine::new(config.smoothing_range_ms, config.smoothing_threads),
            config,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        info!(
            interval_ms = self.config.compute_interval_ms,
            depth_ms = self.config.compute_depth_ms,
            "load analyzer started"
        );
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.compute_interval_ms));
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }
        info!("load analyzer stopped");
    }

    async fn tick(&self) {
        let _guard = self.store.ultimate_lock().await;
        let since = Utc::now() - chrono::Duration::milliseconds(self.config.compute_depth_ms as i64);

        let types = match self.store.list_data_types().await {
            Ok(types) => types,
            Err(error) => {
                warn!(%error, "listing data types failed, skipping tick");
                return;
            }
        };

        let mut handles = Vec::with_capacity(types.len());
        for data_type in types {
            let store = Arc::clone(&self.store);
            let bus = Arc::clone(&self.bus);
            let smoothing = self.smoothing;
            handles.push(tokio::spawn(async move {
                if let Err(error) = analyze_class(&store, &bus, smoothing, &data_type, since).await
                {
                    warn!(class = %data_type.name, %error, "load analysis failed");
                }
            }));
        }
        // Join the fan-out before the advisory lock is released.
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn analyze_class(
    store: &TrafficStore,
    bus: &DisplayBus,
    smoothing: SmoothingEngine,
    data_type: &DataType,
    since: DateTime<Utc>,
) -> Result<(), CoreError> {
    for direction in [Direction::Rx, Direction::Tx] {
        let rows = store.list_recent(&data_type.name, since, direction).await?;
        let smoothed = smooth_rows(smoothing, rows).await?;
        let mean = mean_load(&smoothed);

        let template = DisplayTemplate::load(data_type.id, data_type.name.clone(), direction);
        bus.update_load(template, mean).await;
    }
    Ok(())
}
