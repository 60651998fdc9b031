// ── Capture pipeline: fold, tick, hand off ──
//
// The capture loop owns a per-tick map keyed by classification key. Every
// inner frame folds into the map; when the batch window elapses the map
// is swapped for an empty one and the drained batch is written by a fresh
// store-writer task, so the loop itself never waits on the store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::capture::{tzsp, Classifier, FrameCapture};
use crate::config::CaptureConfig;
use crate::error::CoreError;
use crate::model::{FlowKey, NewRawData};
use crate::store::TrafficStore;

struct Accumulator {
    bytes: u64,
    last_seen: DateTime<Utc>,
}

/// Per-tick working map from classification key to byte accumulator.
///
/// Keys keep their first-fold position so the drained batch preserves
/// capture order.
#[derive(Default)]
pub struct BatchMap {
    entries: HashMap<FlowKey, Accumulator>,
    order: Vec<FlowKey>,
}

impl BatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classified frame into the map.
    pub fn fold(&mut self, key: FlowKey, bytes: u64, timestamp: DateTime<Utc>) {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                let accumulator = entry.get_mut();
                accumulator.bytes += bytes;
                accumulator.last_seen = timestamp;
            }
            Entry::Vacant(entry) => {
                entry.insert(Accumulator {
                    bytes,
                    last_seen: timestamp,
                });
                self.order.push(key);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drain into insert payloads, leaving the map empty for the next tick.
    pub fn drain(&mut self) -> Vec<NewRawData> {
        let mut entries = std::mem::take(&mut self.entries);
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|key| {
                entries.remove(&key).map(|accumulator| NewRawData {
                    key,
                    bytes: accumulator.bytes,
                    timestamp: accumulator.last_seen,
                })
            })
            .collect()
    }
}

/// The capture side of the appliance: adapter → TZSP → classifier → batches.
pub struct CapturePipeline {
    store: Arc<TrafficStore>,
    config: CaptureConfig,
}

impl CapturePipeline {
    pub fn new(store: Arc<TrafficStore>, config: CaptureConfig) -> Self {
        Self { store, config }
    }

    /// Open the adapter and start the capture loop on a blocking thread.
    ///
    /// Adapter or filter failures surface here and abort startup; once
    /// running, per-frame problems are counted drops.
    pub fn spawn(self, cancel: CancellationToken) -> Result<JoinHandle<()>, CoreError> {
        let capture = FrameCapture::open(&self.config)?;
        let classifier = Classifier::new(self.config.router_mac);
        let data_buffer = Duration::from_millis(self.config.data_buffer_ms);
        let store = self.store;
        let runtime = Handle::current();

        Ok(tokio::task::spawn_blocking(move || {
            capture_loop(capture, classifier, data_buffer, store, runtime, cancel);
        }))
    }
}

fn capture_loop(
    mut capture: FrameCapture,
    classifier: Classifier,
    data_buffer: Duration,
    store: Arc<TrafficStore>,
    runtime: Handle,
    cancel: CancellationToken,
) {
    let mut batch = BatchMap::new();
    let mut last_flush = Instant::now();
    let mut skipped: u64 = 0;
    info!("frame processing started");

    while !cancel.is_cancelled() {
        match capture.next_frame() {
            Ok(Some(frame)) => {
                let classified = tzsp::extract_inner(frame)
                    .and_then(|inner| classifier.classify(inner));
                match classified {
                    Some((key, bytes)) => batch.fold(key, bytes, Utc::now()),
                    None => skipped += 1,
                }
            }
            Ok(None) => {} // adapter read timeout; fall through to the flush check
            Err(error) => {
                error!(%error, "frame capture failed");
                break;
            }
        }

        if last_flush.elapsed() >= data_buffer {
            last_flush = Instant::now();
            if !batch.is_empty() {
                let rows = batch.drain();
                debug!(keys = rows.len(), skipped, "handing batch to store writer");
                let store = Arc::clone(&store);
                runtime.spawn(async move {
                    match store.insert_batch(&rows).await {
                        Ok(inserted) => debug!(inserted, "batch persisted"),
                        Err(error) => {
                            // Rolled back by the store; the batch is lost.
                            error!(%error, rows = rows.len(), "batch insert failed");
                        }
                    }
                });
            }
        }
    }

    info!(skipped, "frame processing stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    fn key(src_port: u16) -> FlowKey {
        FlowKey {
            network_protocol: 0x0800,
            transport_protocol: 17,
            src_port,
            dst_port: 443,
            direction: Direction::Rx,
        }
    }

    #[test]
    fn fold_accumulates_bytes_and_keeps_last_timestamp() {
        let mut batch = BatchMap::new();
        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::milliseconds(10);

        batch.fold(key(53), 100, t1);
        batch.fold(key(53), 50, t2);

        let rows = batch.drain();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bytes, 150);
        assert_eq!(rows[0].timestamp, t2);
    }

    #[test]
    fn drain_preserves_first_fold_order() {
        let mut batch = BatchMap::new();
        let now = Utc::now();
        batch.fold(key(3), 1, now);
        batch.fold(key(1), 1, now);
        batch.fold(key(2), 1, now);
        batch.fold(key(1), 1, now); // re-fold must not reorder

        let ports: Vec<u16> = batch.drain().iter().map(|r| r.key.src_port).collect();
        assert_eq!(ports, vec![3, 1, 2]);
    }

    #[test]
    fn drain_leaves_map_empty() {
        let mut batch = BatchMap::new();
        batch.fold(key(1), 10, Utc::now());
        assert_eq!(batch.len(), 1);

        let _ = batch.drain();
        assert!(batch.is_empty());

        batch.fold(key(2), 20, Utc::now());
        let rows = batch.drain();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.src_port, 2);
    }
}
