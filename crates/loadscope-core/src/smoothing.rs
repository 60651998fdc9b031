// ── Time-window smoothing engine ──
//
// Reduces an ordered slice of raw records into a fixed-cadence vector of
// bucket sums. The output is partitioned into contiguous index ranges and
// filled by scoped worker threads writing disjoint slices, so the result
// is bit-identical for any worker count.

use chrono::{DateTime, Duration, Utc};

use crate::model::{RawRecord, SmoothedPoint};

/// Parallel time-windowed bucket reducer.
///
/// Bucket `k` covers `[first + k*window, first + (k+1)*window)` and its
/// value is the byte sum of the rows inside; the point carries the right
/// edge as its timestamp.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingEngine {
    window_ms: u64,
    worker_hint: usize,
}

impl SmoothingEngine {
    pub fn new(window_ms: u64, worker_hint: usize) -> Self {
        Self {
            window_ms,
            worker_hint: worker_hint.max(1),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Smooth `rows` (ordered by timestamp ascending) into bucket sums.
    ///
    /// Empty input produces empty output. The bucket count is
    /// `ceil(span / window)`, plus one extra bucket when the span is an
    /// exact multiple of the window so the final edge gets its own bucket.
    pub fn smooth(&self, rows: &[RawRecord]) -> Vec<SmoothedPoint> {
        if rows.is_empty() {
            return Vec::new();
        }

        let first = rows[0].timestamp;
        let last = rows[rows.len() - 1].timestamp;
        let span = (last - first).num_milliseconds().max(0) as u64;
        let mut parts = span.div_ceil(self.window_ms) as usize;
        if span % self.window_ms == 0 {
            parts += 1;
        }

        let mut output: Vec<SmoothedPoint> = (0..parts)
            .map(|k| SmoothedPoint {
                value: 0.0,
                timestamp: bucket_edge(first, self.window_ms, k + 1),
            })
            .collect();

        let workers = effective_workers(self.worker_hint, parts);
        let chunk = parts / workers;

        std::thread::scope(|scope| {
            let mut rest = output.as_mut_slice();
            for worker in 0..workers {
                let take = if worker == workers - 1 {
                    rest.len()
                } else {
                    chunk
                };
                let (slice, tail) = std::mem::take(&mut rest).split_at_mut(take);
                rest = tail;
                let start_bucket = worker * chunk;
                let window = self.window_ms;
                scope.spawn(move || fill_buckets(rows, first, window, start_bucket, slice));
            }
        });

        output
    }
}

/// Halve the worker hint until every worker owns at least one bucket.
fn effective_workers(hint: usize, parts: usize) -> usize {
    let mut workers = hint;
    while workers > 1 && parts / workers < 1 {
        workers /= 2;
    }
    workers.max(1)
}

fn bucket_edge(first: DateTime<Utc>, window_ms: u64, k: usize) -> DateTime<Utc> {
    first + Duration::milliseconds(k as i64 * window_ms as i64)
}

/// Sum rows into the buckets `[start_bucket, start_bucket + out.len())`.
///
/// Rows are located with binary partition points over the ordered input,
/// so each worker touches only its own output slots.
fn fill_buckets(
    rows: &[RawRecord],
    first: DateTime<Utc>,
    window_ms: u64,
    start_bucket: usize,
    out: &mut [SmoothedPoint],
) {
    for (offset, point) in out.iter_mut().enumerate() {
        let k = start_bucket + offset;
        let lower = bucket_edge(first, window_ms, k);
        let upper = bucket_edge(first, window_ms, k + 1);
        let begin = rows.partition_point(|r| r.timestamp < lower);
        let end = rows.partition_point(|r| r.timestamp < upper);
        point.value = rows[begin..end].iter().map(|r| r.bytes as f64).sum();
    }
}
