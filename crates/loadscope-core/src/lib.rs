// loadscope-core: streaming traffic pipeline and the analysis engines it feeds.
//
// Mirrored frames arrive as TZSP-over-UDP, are classified per traffic class,
// batched into a relational store, and periodically reduced into realtime and
// predicted load that drives a character LCD plus an LED strip.

pub mod admin;
pub mod analyzer;
pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod smoothing;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use admin::AdminApi;
pub use analyzer::{DataCleaner, LoadAnalyzer, PredictionAnalyzer};
pub use capture::{CapturePipeline, Classifier, FrameCapture};
pub use config::{
    AnalyzerConfig, CaptureConfig, CleaningConfig, DisplayConfig, ForecasterConfig, LcdPins,
    PredictionConfig,
};
pub use display::{DisplayBus, DisplayDriver, ScriptDriver};
pub use error::{CoreError, ValidationErrors};
pub use smoothing::SmoothingEngine;
pub use store::TrafficStore;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DataType, Direction, DisplayTemplate, FlowKey, MacAddress, NewRawData, RawRecord,
    SmoothedPoint, TrafficState,
};
