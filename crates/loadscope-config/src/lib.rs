//! Configuration for the loadscope appliance.
//!
//! TOML file merged with `LOADSCOPE_`-prefixed environment variables,
//! validated, and translated into the plain config structs the core
//! consumes. Sections mirror the configuration groups of the appliance:
//! capture, store, cleaning, the two analyzers, forecaster, display.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use loadscope_core::{
    AnalyzerConfig, CaptureConfig, CleaningConfig, DisplayConfig, ForecasterConfig, LcdPins,
    MacAddress, PredictionConfig,
};

/// Default config file next to the binary.
pub const DEFAULT_CONFIG_PATH: &str = "loadscope.toml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML sections ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub capture: CaptureSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub cleaning: CleaningSection,
    #[serde(default)]
    pub load_analyzer: AnalyzerSection,
    #[serde(default)]
    pub prediction: PredictionSection,
    pub forecaster: ForecasterSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CaptureSection {
    /// Adapter name as pcap knows it (e.g. "eth0").
    pub adapter: String,
    /// MAC address of the monitored router interface.
    pub router_mac: String,
    /// Link bandwidth in bytes per second.
    pub link_bandwidth: u64,
    #[serde(default = "default_snap_len")]
    pub snap_len: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u32,
    #[serde(default = "default_data_buffer_ms")]
    pub data_buffer_ms: u64,
}

fn default_snap_len() -> u32 {
    65_535
}
fn default_read_timeout_ms() -> u32 {
    1_000
}
fn default_data_buffer_ms() -> u64 {
    3_000
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("loadscope.db")
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CleaningSection {
    #[serde(default = "default_cleaning_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_cleaning_depth_ms")]
    pub depth_ms: u64,
}

impl Default for CleaningSection {
    fn default() -> Self {
        Self {
            interval_ms: default_cleaning_interval_ms(),
            depth_ms: default_cleaning_depth_ms(),
        }
    }
}

fn default_cleaning_interval_ms() -> u64 {
    60_000
}
fn default_cleaning_depth_ms() -> u64 {
    3_600_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerSection {
    #[serde(default = "default_smoothing_range_ms")]
    pub smoothing_range_ms: u64,
    #[serde(default = "default_smoothing_threads")]
    pub smoothing_threads: usize,
    #[serde(default = "default_compute_interval_ms")]
    pub compute_interval_ms: u64,
    #[serde(default = "default_compute_depth_ms")]
    pub compute_depth_ms: u64,
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            smoothing_range_ms: default_smoothing_range_ms(),
            smoothing_threads: default_smoothing_threads(),
            compute_interval_ms: default_compute_interval_ms(),
            compute_depth_ms: default_compute_depth_ms(),
        }
    }
}

fn default_smoothing_range_ms() -> u64 {
    1_000
}
fn default_smoothing_threads() -> usize {
    4
}
fn default_compute_interval_ms() -> u64 {
    10_000
}
fn default_compute_depth_ms() -> u64 {
    60_000
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictionSection {
    #[serde(flatten)]
    pub analyzer: AnalyzerSection,
    #[serde(default = "default_prediction_horizon_ms")]
    pub prediction_horizon_ms: u64,
    #[serde(default = "default_designator")]
    pub designator: f64,
}

impl Default for PredictionSection {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerSection::default(),
            prediction_horizon_ms: default_prediction_horizon_ms(),
            designator: default_designator(),
        }
    }
}

fn default_prediction_horizon_ms() -> u64 {
    30_000
}
fn default_designator() -> f64 {
    0.1
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ForecasterSection {
    pub host: String,
    #[serde(default = "default_forecaster_port")]
    pub port: u16,
    #[serde(default = "default_forecaster_sessions")]
    pub sessions: usize,
}

fn default_forecaster_port() -> u16 {
    6_311
}
fn default_forecaster_sessions() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplaySection {
    #[serde(default = "default_lcd_script")]
    pub lcd_script: PathBuf,
    #[serde(default = "default_lcd_pins")]
    pub lcd_pins: Vec<u32>,
    #[serde(default = "default_led_script")]
    pub led_script: PathBuf,
    #[serde(default = "default_led_pin")]
    pub led_pin: u32,
    #[serde(default = "default_led_count")]
    pub led_count: u32,
    #[serde(default = "default_led_brightness")]
    pub led_brightness: u32,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            lcd_script: default_lcd_script(),
            lcd_pins: default_lcd_pins(),
            led_script: default_led_script(),
            led_pin: default_led_pin(),
            led_count: default_led_count(),
            led_brightness: default_led_brightness(),
        }
    }
}

fn default_lcd_script() -> PathBuf {
    PathBuf::from("./char_lcd.py")
}
fn default_lcd_pins() -> Vec<u32> {
    // RS, EN, DB4..DB7, backlight
    vec![26, 19, 13, 6, 5, 11, 4]
}
fn default_led_script() -> PathBuf {
    PathBuf::from("./led_strip.py")
}
fn default_led_pin() -> u32 {
    18
}
fn default_led_count() -> u32 {
    8
}
fn default_led_brightness() -> u32 {
    64
}

// ── Validated application config ────────────────────────────────────

/// Fully validated configuration, ready to wire into the core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub store_path: PathBuf,
    pub cleaning: CleaningConfig,
    pub load_analyzer: AnalyzerConfig,
    pub prediction: PredictionConfig,
    pub forecaster: ForecasterConfig,
    pub display: DisplayConfig,
}

/// Load, merge, and validate the configuration.
///
/// `path` falls back to [`DEFAULT_CONFIG_PATH`]; environment variables
/// prefixed `LOADSCOPE_` override file values (nested keys join with
/// `__`, e.g. `LOADSCOPE_CAPTURE__ADAPTER`).
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOADSCOPE_").split("__"));
    let config: Config = figment.extract()?;
    validate(config)
}

/// Extract and validate from an explicit figment (used by tests).
pub fn from_figment(figment: Figment) -> Result<AppConfig, ConfigError> {
    let config: Config = figment.extract()?;
    validate(config)
}

fn validate(config: Config) -> Result<AppConfig, ConfigError> {
    let router_mac: MacAddress =
        config
            .capture
            .router_mac
            .parse()
            .map_err(|reason| ConfigError::Validation {
                field: "capture.router_mac".into(),
                reason,
            })?;

    require_nonzero(config.capture.data_buffer_ms, "capture.data_buffer_ms")?;
    require_nonzero(config.capture.link_bandwidth, "capture.link_bandwidth")?;
    require_nonzero(config.cleaning.interval_ms, "cleaning.interval_ms")?;
    require_nonzero(config.cleaning.depth_ms, "cleaning.depth_ms")?;
    validate_analyzer(&config.load_analyzer, "load_analyzer")?;
    validate_analyzer(&config.prediction.analyzer, "prediction")?;
    require_nonzero(
        config.prediction.prediction_horizon_ms,
        "prediction.prediction_horizon_ms",
    )?;

    if !(0.0..=1.0).contains(&config.prediction.designator) {
        return Err(ConfigError::Validation {
            field: "prediction.designator".into(),
            reason: format!(
                "must be a fraction in [0, 1], got {}",
                config.prediction.designator
            ),
        });
    }
    if config.forecaster.sessions == 0 {
        return Err(ConfigError::Validation {
            field: "forecaster.sessions".into(),
            reason: "at least one session is required".into(),
        });
    }
    if config.display.lcd_pins.len() != 7 {
        return Err(ConfigError::Validation {
            field: "display.lcd_pins".into(),
            reason: format!(
                "expected 7 pins (RS, EN, DB4-DB7, backlight), got {}",
                config.display.lcd_pins.len()
            ),
        });
    }

    let pins = &config.display.lcd_pins;
    let display = DisplayConfig {
        lcd_script: config.display.lcd_script,
        lcd_pins: LcdPins {
            rs: pins[0],
            en: pins[1],
            db4: pins[2],
            db5: pins[3],
            db6: pins[4],
            db7: pins[5],
            backlight: pins[6],
        },
        led_script: config.display.led_script,
        led_pin: config.display.led_pin,
        led_count: config.display.led_count,
        led_brightness: config.display.led_brightness,
    };

    Ok(AppConfig {
        capture: CaptureConfig {
            adapter: config.capture.adapter,
            snap_len: config.capture.snap_len,
            read_timeout_ms: config.capture.read_timeout_ms,
            data_buffer_ms: config.capture.data_buffer_ms,
            router_mac,
            link_bandwidth: config.capture.link_bandwidth,
        },
        store_path: config.store.path,
        cleaning: CleaningConfig {
            interval_ms: config.cleaning.interval_ms,
            depth_ms: config.cleaning.depth_ms,
        },
        load_analyzer: analyzer_config(&config.load_analyzer),
        prediction: PredictionConfig {
            analyzer: analyzer_config(&config.prediction.analyzer),
            prediction_horizon_ms: config.prediction.prediction_horizon_ms,
            designator: config.prediction.designator,
        },
        forecaster: ForecasterConfig {
            host: config.forecaster.host,
            port: config.forecaster.port,
            sessions: config.forecaster.sessions,
        },
        display,
    })
}

fn analyzer_config(section: &AnalyzerSection) -> AnalyzerConfig {
    AnalyzerConfig {
        smoothing_range_ms: section.smoothing_range_ms,
        smoothing_threads: section.smoothing_threads,
        compute_interval_ms: section.compute_interval_ms,
        compute_depth_ms: section.compute_depth_ms,
    }
}

fn validate_analyzer(section: &AnalyzerSection, name: &str) -> Result<(), ConfigError> {
    require_nonzero(section.smoothing_range_ms, &format!("{name}.smoothing_range_ms"))?;
    require_nonzero(
        section.smoothing_threads as u64,
        &format!("{name}.smoothing_threads"),
    )?;
    require_nonzero(
        section.compute_interval_ms,
        &format!("{name}.compute_interval_ms"),
    )?;
    require_nonzero(section.compute_depth_ms, &format!("{name}.compute_depth_ms"))
}

fn require_nonzero(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [capture]
        adapter = "eth0"
        router_mac = "aa:bb:cc:dd:ee:01"
        link_bandwidth = 12500000

        [forecaster]
        host = "127.0.0.1"
    "#;

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let app = from_toml(MINIMAL).unwrap();
        assert_eq!(app.capture.adapter, "eth0");
        assert_eq!(app.capture.snap_len, 65_535);
        assert_eq!(app.capture.data_buffer_ms, 3_000);
        assert_eq!(app.store_path, PathBuf::from("loadscope.db"));
        assert_eq!(app.cleaning.interval_ms, 60_000);
        assert_eq!(app.load_analyzer.smoothing_range_ms, 1_000);
        assert_eq!(app.prediction.prediction_horizon_ms, 30_000);
        assert_eq!(app.prediction.designator, 0.1);
        assert_eq!(app.forecaster.port, 6_311);
        assert_eq!(app.forecaster.sessions, 2);
        assert_eq!(app.display.lcd_pins.rs, 26);
    }

    #[test]
    fn sections_override_defaults() {
        let toml = format!(
            "{MINIMAL}\n[prediction]\nsmoothing_range_ms = 5000\ndesignator = 0.25\n"
        );
        let app = from_toml(&toml).unwrap();
        assert_eq!(app.prediction.analyzer.smoothing_range_ms, 5_000);
        assert_eq!(app.prediction.designator, 0.25);
        // The load analyzer keeps its own default.
        assert_eq!(app.load_analyzer.smoothing_range_ms, 1_000);
    }

    #[test]
    fn malformed_mac_is_rejected() {
        let toml = MINIMAL.replace("aa:bb:cc:dd:ee:01", "not-a-mac");
        let err = from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "capture.router_mac"));
    }

    #[test]
    fn designator_outside_unit_interval_is_rejected() {
        let toml = format!("{MINIMAL}\n[prediction]\ndesignator = 1.5\n");
        let err = from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "prediction.designator"));
    }

    #[test]
    fn zero_sessions_is_rejected() {
        let toml = MINIMAL.replace(
            "host = \"127.0.0.1\"",
            "host = \"127.0.0.1\"\nsessions = 0",
        );
        let err = from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "forecaster.sessions"));
    }

    #[test]
    fn wrong_pin_count_is_rejected() {
        let toml = format!("{MINIMAL}\n[display]\nlcd_pins = [1, 2, 3]\n");
        let err = from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "display.lcd_pins"));
    }

    #[test]
    fn missing_capture_section_fails() {
        let err = from_toml("[forecaster]\nhost = \"127.0.0.1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }
}
