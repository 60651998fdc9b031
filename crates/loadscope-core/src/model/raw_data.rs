use chrono::{DateTime, Utc};

use super::Direction;

/// Transient classification key of one inner frame.
///
/// Lives only between the classifier and the batch aggregator; the store
/// matches its fields against the data-type catalog at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub network_protocol: u16,
    pub transport_protocol: u8,
    pub src_port: u16,
    pub dst_port: u16,
    pub direction: Direction,
}

/// One aggregated byte-count headed for the store.
#[derive(Debug, Clone)]
pub struct NewRawData {
    pub key: FlowKey,
    pub bytes: u64,
    /// Last-seen timestamp of the key within its batch window.
    pub timestamp: DateTime<Utc>,
}

/// One persisted byte-count record.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub bytes: u64,
    pub direction: Direction,
}

/// One point of a fixed-cadence smoothed series; the timestamp is the
/// right edge of the bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPoint {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}
