// ── Predictive load analyzer ──
//
// Same tick shape as the realtime analyzer, restricted to classes with
// forecasting enabled. Both directions of a class run their ARIMA
// evaluations concurrently through the session pool; results are clamped
// to the link bandwidth before averaging.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use loadscope_forecast::{forecast_load, SessionPool};

use super::smooth_rows;
use crate::config::PredictionConfig;
use crate::display::DisplayBus;
use crate::error::CoreError;
use crate::model::{DataType, Direction, DisplayTemplate, SmoothedPoint};
use crate::smoothing::SmoothingEngine;
use crate::store::TrafficStore;

pub struct PredictionAnalyzer {
    store: Arc<TrafficStore>,
    bus: Arc<DisplayBus>,
    pool: Arc<SessionPool>,
    smoothing: SmoothingEngine,
    config: PredictionConfig,
    link_bandwidth: u64,
    horizon_buckets: usize,
}

impl PredictionAnalyzer {
    pub fn new(
        store: Arc<TrafficStore>,
        bus: Arc<DisplayBus>,
        pool: Arc<SessionPool>,
        config: PredictionConfig,
        link_bandwidth: u64,
    ) -> Self {
        let analyzer = config.analyzer;
        Self {
            store,
            bus,
            pool,
            smoothing: SmoothingEngine::new(
                analyzer.smoothing_range_ms,
                analyzer.smoothing_threads,
            ),
            horizon_buckets: horizon_buckets(
                config.prediction_horizon_ms,
                analyzer.smoothing_range_ms,
            ),
            config,
            link_bandwidth,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        info!(
            interval_ms = self.config.analyzer.compute_interval_ms,
            horizon_buckets = self.horizon_buckets,
            "prediction analyzer started"
        );
        let mut interval = tokio::time::interval(Duration::from_millis(
            self.config.analyzer.compute_interval_ms,
        ));
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }
        info!("prediction analyzer stopped");
    }

    async fn tick(&self) {
        let _guard = self.store.ultimate_lock().await;
        let since = Utc::now()
            - chrono::Duration::milliseconds(self.config.analyzer.compute_depth_ms as i64);

        let types = match self.store.list_data_types().await {
            Ok(types) => types,
            Err(error) => {
                warn!(%error, "listing data types failed, skipping tick");
                return;
            }
        };

        let mut handles = Vec::new();
        for data_type in types.into_iter().filter(|t| t.forecasting) {
            let store = Arc::clone(&self.store);
            let bus = Arc::clone(&self.bus);
            let pool = Arc::clone(&self.pool);
            let smoothing = self.smoothing;
            let horizon = self.horizon_buckets;
            let link_bandwidth = self.link_bandwidth;
            handles.push(tokio::spawn(async move {
                let outcome = predict_class(
                    &store,
                    &bus,
                    &pool,
                    smoothing,
                    &data_type,
                    since,
                    horizon,
                    link_bandwidth,
                )
                .await;
                if let Err(error) = outcome {
                    warn!(class = %data_type.name, %error, "prediction failed");
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Horizon expressed in smoothed buckets.
fn horizon_buckets(horizon_ms: u64, smoothing_range_ms: u64) -> usize {
    horizon_ms.div_ceil(smoothing_range_ms) as usize
}

#[allow(clippy::too_many_arguments)]
async fn predict_class(
    store: &TrafficStore,
    bus: &DisplayBus,
    pool: &SessionPool,
    smoothing: SmoothingEngine,
    data_type: &DataType,
    since: DateTime<Utc>,
    horizon: usize,
    link_bandwidth: u64,
) -> Result<(), CoreError> {
    let rx_rows = store
        .list_recent(&data_type.name, since, Direction::Rx)
        .await?;
    let tx_rows = store
        .list_recent(&data_type.name, since, Direction::Tx)
        .await?;
    let rx_values = to_values(&smooth_rows(smoothing, rx_rows).await?);
    let tx_values = to_values(&smooth_rows(smoothing, tx_rows).await?);

    let (rx_forecast, tx_forecast) = tokio::try_join!(
        forecast_direction(pool, rx_values, horizon),
        forecast_direction(pool, tx_values, horizon),
    )?;

    let rx_mean = mean_value(&standardize(rx_forecast, link_bandwidth));
    let tx_mean = mean_value(&standardize(tx_forecast, link_bandwidth));

    bus.update_prediction(
        DisplayTemplate::prediction(data_type.id, data_type.name.clone(), Direction::Rx),
        rx_mean,
    )
    .await;
    bus.update_prediction(
        DisplayTemplate::prediction(data_type.id, data_type.name.clone(), Direction::Tx),
        tx_mean,
    )
    .await;
    Ok(())
}

/// One ARIMA evaluation through the pool; empty input short-circuits to a
/// zero vector without consuming a session.
async fn forecast_direction(
    pool: &SessionPool,
    values: Vec<f64>,
    horizon: usize,
) -> Result<Vec<f64>, CoreError> {
    if values.is_empty() {
        return Ok(vec![0.0; horizon]);
    }
    let lease = pool.acquire().await?;
    let forecast = forecast_load(&lease, &values, horizon).await?;
    Ok(forecast)
}

fn to_values(points: &[SmoothedPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

/// Clamp every predicted element into `[0, link_bandwidth]`.
fn standardize(values: Vec<f64>, link_bandwidth: u64) -> Vec<f64> {
    let cap = link_bandwidth as f64;
    values.into_iter().map(|v| v.clamp(0.0, cap)).collect()
}

fn mean_value(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
