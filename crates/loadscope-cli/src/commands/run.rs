//! The `run` subcommand: wire every component and run until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use loadscope_core::{
    CapturePipeline, DataCleaner, DisplayBus, LoadAnalyzer, PredictionAnalyzer, ScriptDriver,
    TrafficStore,
};
use loadscope_forecast::SessionPool;

use crate::error::CliError;

pub async fn execute(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let app = loadscope_config::load(config_path.as_deref())?;

    let store = Arc::new(TrafficStore::open(&app.store_path)?);

    let pool = Arc::new(
        SessionPool::connect(
            &app.forecaster.host,
            app.forecaster.port,
            app.forecaster.sessions,
        )
        .await?,
    );

    let driver = ScriptDriver::new(app.display.clone());
    let bus = Arc::new(DisplayBus::new(
        Box::new(driver),
        app.load_analyzer.smoothing_range_ms,
        app.prediction.designator,
        app.capture.link_bandwidth,
    ));
    bus.boot().await;

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    handles.push(
        CapturePipeline::new(Arc::clone(&store), app.capture.clone())
            .spawn(cancel.clone())?,
    );
    handles.push(DataCleaner::new(Arc::clone(&store), app.cleaning).spawn(cancel.clone()));
    handles.push(
        LoadAnalyzer::new(Arc::clone(&store), Arc::clone(&bus), app.load_analyzer)
            .spawn(cancel.clone()),
    );
    handles.push(
        PredictionAnalyzer::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&pool),
            app.prediction,
            app.capture.link_bandwidth,
        )
        .spawn(cancel.clone()),
    );

    info!("loadscope is running; press Ctrl-C to stop");
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "signal handler failed, shutting down");
    }

    info!("shutting down");
    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
    pool.close().await;

    Ok(())
}
