// ── Periodic analysis engines ──
//
// Three long-lived tasks, each owning a ticker and a cancellation token:
// the retention cleaner, the realtime load analyzer, and the prediction
// analyzer. The two analyzers hold the store's advisory lock for a whole
// tick and join their per-class fan-out before releasing it.

mod cleaner;
mod load;
mod prediction;

pub use cleaner::DataCleaner;
pub use load::LoadAnalyzer;
pub use prediction::PredictionAnalyzer;

use crate::error::CoreError;
use crate::model::{RawRecord, SmoothedPoint};
use crate::smoothing::SmoothingEngine;

/// Run the smoothing engine off the async runtime's worker threads.
pub(crate) async fn smooth_rows(
    engine: SmoothingEngine,
    rows: Vec<RawRecord>,
) -> Result<Vec<SmoothedPoint>, CoreError> {
    tokio::task::spawn_blocking(move || engine.smooth(&rows))
        .await
        .map_err(|join_error| CoreError::Internal(join_error.to_string()))
}

/// Arithmetic mean of smoothed bucket values; empty input is zero load.
pub(crate) fn mean_load(points: &[SmoothedPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn point(value: f64) -> SmoothedPoint {
        SmoothedPoint {
            value,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert_eq!(mean_load(&[]), 0.0);
    }

    #[test]
    fn mean_of_buckets() {
        let points = vec![point(45.0), point(55.0), point(120.0), point(105.0)];
        assert_eq!(mean_load(&points), 81.25);
    }
}
