// Integration: the load analyzer's periodic pass over a live store,
// observed through the display bus.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use loadscope_core::{
    AnalyzerConfig, CoreError, DataType, Direction, DisplayBus, DisplayDriver, FlowKey,
    LoadAnalyzer, NewRawData, TrafficStore,
};

struct SilentDriver;

#[async_trait]
impl DisplayDriver for SilentDriver {
    async fn write_lines(&self, _l1: &str, _l2: &str) -> Result<(), CoreError> {
        Ok(())
    }
    async fn set_color(&self, _r: u8, _g: u8, _b: u8) -> Result<(), CoreError> {
        Ok(())
    }
}

fn row(direction: Direction, bytes: u64, offset_ms: i64) -> NewRawData {
    NewRawData {
        key: FlowKey {
            network_protocol: 0x0800,
            transport_protocol: 17,
            src_port: 53,
            dst_port: 40_000,
            direction,
        },
        bytes,
        timestamp: Utc::now() + chrono::Duration::milliseconds(offset_ms),
    }
}

#[tokio::test]
async fn analyzer_publishes_both_directions_of_every_class() {
    let store = Arc::new(TrafficStore::open_in_memory().unwrap());
    store
        .create_data_type(&DataType {
            id: 0,
            name: "dns".into(),
            forecasting: false,
            network_protocol: 0x0800,
            transport_protocol: 17,
            port: 53,
        })
        .await
        .unwrap();

    store
        .insert_batch(&[
            row(Direction::Rx, 100, -400),
            row(Direction::Rx, 50, -200),
            row(Direction::Tx, 30, -300),
        ])
        .await
        .unwrap();

    let bus = Arc::new(DisplayBus::new(Box::new(SilentDriver), 1000, 0.1, 10_000));
    let cancel = CancellationToken::new();
    let analyzer = LoadAnalyzer::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        AnalyzerConfig {
            smoothing_range_ms: 1000,
            smoothing_threads: 2,
            compute_interval_ms: 50,
            compute_depth_ms: 60_000,
        },
    );
    let handle = analyzer.spawn(cancel.clone());

    // Give the ticker a few periods to run at least one full pass.
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(bus.entry_count().await, 2);
    let current = bus.current_template().await.unwrap();
    assert_eq!(current.class_name, "dns");
    assert!(!current.prediction);

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
}
