// ── LCD line formatting ──
//
// Two 16-character lines: direction plus truncated class name on top,
// scaled value with unit and rate suffix below. Prediction lines steal
// two name characters for the trend marker.

use crate::model::{DisplayTemplate, TrafficState};

const LINE_LENGTH: usize = 16;
/// "RX " prefix leaves 13 characters for the name.
const MEAN_NAME_LENGTH: usize = LINE_LENGTH - 3;
/// "RX " prefix plus " S" suffix leaves 11.
const PREDICTION_NAME_LENGTH: usize = LINE_LENGTH - 5;

const KB_RATIO: f64 = 1_000.0;
const MB_RATIO: f64 = 1_000_000.0;
const B_TO_KB_THRESHOLD: f64 = 10_000.0;
const KB_TO_MB_THRESHOLD: f64 = 10_000_000_000.0;

/// 1000 ms renders as the implicit "/s" rate.
const BASIC_RATE_MS: u64 = 1000;

pub fn mean_lines(
    smoothing_range_ms: u64,
    template: &DisplayTemplate,
    value: f64,
) -> (String, String) {
    let line1 = format!(
        "{} {}",
        template.direction.label(),
        truncate_name(&template.class_name, MEAN_NAME_LENGTH)
    );
    (line1, value_line(smoothing_range_ms, value))
}

pub fn prediction_lines(
    smoothing_range_ms: u64,
    template: &DisplayTemplate,
    value: f64,
    state: TrafficState,
) -> (String, String) {
    let line1 = format!(
        "{} {} {}",
        template.direction.label(),
        truncate_name(&template.class_name, PREDICTION_NAME_LENGTH),
        state.symbol()
    );
    (line1, value_line(smoothing_range_ms, value))
}

fn value_line(smoothing_range_ms: u64, value: f64) -> String {
    let (amount, unit) = scaled_value(value);
    format!("{amount} {unit}{}", rate_suffix(smoothing_range_ms))
}

/// Integer-truncating unit scaling: B below 10 kB, kB below 10 GB, MB above.
fn scaled_value(value: f64) -> (u64, &'static str) {
    if value < B_TO_KB_THRESHOLD {
        (value as u64, "B")
    } else if value < KB_TO_MB_THRESHOLD {
        ((value / KB_RATIO) as u64, "kB")
    } else {
        ((value / MB_RATIO) as u64, "MB")
    }
}

fn rate_suffix(smoothing_range_ms: u64) -> String {
    if smoothing_range_ms == BASIC_RATE_MS {
        "/s".to_string()
    } else {
        format!("/{}", smoothing_range_ms / BASIC_RATE_MS)
    }
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}
