// ── Display bus ──
//
// Owns the ordered set of renderable entries, the pointer to the one
// currently shown, and the driver seam. One lock serializes every state
// change; rendering happens while it is held so the LCD always shows a
// consistent entry.

pub mod color;
mod driver;
pub mod format;

pub use driver::{DisplayDriver, ScriptDriver};

use std::collections::BTreeMap;
use std::ops::Bound;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::model::{DisplayTemplate, TrafficState};

/// First LCD line shown at boot and whenever no entry is left.
pub const BOOT_FIRST_LINE: &str = "loadscope";
/// Second LCD line of the boot banner.
pub const BOOT_SECOND_LINE: &str = "traffic monitor";

struct BusState {
    entries: BTreeMap<DisplayTemplate, f64>,
    current: Option<DisplayTemplate>,
}

/// Ordered set of (class, direction, prediction) entries driving LCD+LED.
pub struct DisplayBus {
    driver: Box<dyn DisplayDriver>,
    state: Mutex<BusState>,
    smoothing_range_ms: u64,
    designator: f64,
    link_bandwidth: u64,
}

impl DisplayBus {
    pub fn new(
        driver: Box<dyn DisplayDriver>,
        smoothing_range_ms: u64,
        designator: f64,
        link_bandwidth: u64,
    ) -> Self {
        Self {
            driver,
            state: Mutex::new(BusState {
                entries: BTreeMap::new(),
                current: None,
            }),
            smoothing_range_ms,
            designator,
            link_bandwidth,
        }
    }

    /// Show the boot banner.
    pub async fn boot(&self) {
        if let Err(error) = self
            .driver
            .write_lines(BOOT_FIRST_LINE, BOOT_SECOND_LINE)
            .await
        {
            warn!(%error, "boot banner write failed");
        }
    }

    // ── Analyzer-facing updates ──────────────────────────────────────

    /// Insert or replace a realtime load entry; re-render when it is (or
    /// becomes) the shown one.
    pub async fn update_load(&self, template: DisplayTemplate, value: f64) {
        let mut state = self.state.lock().await;
        state.entries.insert(template.clone(), value);
        self.render_if_current(&mut state, template).await;
    }

    /// Insert or replace a prediction entry; the trend against the paired
    /// load entry is derived at render time.
    pub async fn update_prediction(&self, template: DisplayTemplate, value: f64) {
        let mut state = self.state.lock().await;
        state.entries.insert(template.clone(), value);
        self.render_if_current(&mut state, template).await;
    }

    async fn render_if_current(&self, state: &mut BusState, template: DisplayTemplate) {
        match &state.current {
            Some(current) if *current == template => {
                self.render(state, &template).await;
            }
            None => {
                self.render(state, &template).await;
                state.current = Some(template);
            }
            _ => {}
        }
    }

    // ── Admin-facing mutations ───────────────────────────────────────

    /// Drop every entry of a class; navigate away if it was shown.
    pub async fn remove_class(&self, class_id: i64) {
        let mut state = self.state.lock().await;
        let doomed: Vec<DisplayTemplate> = state
            .entries
            .keys()
            .filter(|t| t.class_id == class_id)
            .cloned()
            .collect();
        self.remove_templates(&mut state, doomed).await;
    }

    /// Drop only the prediction entries of a class.
    pub async fn disable_forecast(&self, class_id: i64) {
        let mut state = self.state.lock().await;
        let doomed: Vec<DisplayTemplate> = state
            .entries
            .keys()
            .filter(|t| t.class_id == class_id && t.prediction)
            .cloned()
            .collect();
        self.remove_templates(&mut state, doomed).await;
    }

    /// Rewrite the cosmetic class name in place; identity is the id.
    pub async fn rename_class(&self, class_id: i64, new_name: &str) {
        let mut state = self.state.lock().await;
        let affected: Vec<DisplayTemplate> = state
            .entries
            .keys()
            .filter(|t| t.class_id == class_id)
            .cloned()
            .collect();
        for old in affected {
            if let Some(value) = state.entries.remove(&old) {
                let mut renamed = old;
                renamed.class_name = new_name.to_string();
                state.entries.insert(renamed, value);
            }
        }
        if let Some(current) = &mut state.current {
            if current.class_id == class_id {
                current.class_name = new_name.to_string();
            }
        }
        debug!(class_id, new_name, "display entries renamed");
    }

    // ── Button navigation ────────────────────────────────────────────

    /// Step to the next entry in the total order; no-op at the end.
    pub async fn button_next(&self) {
        let mut state = self.state.lock().await;
        let Some(current) = state.current.clone() else {
            return;
        };
        let next = state
            .entries
            .range((Bound::Excluded(&current), Bound::Unbounded))
            .next()
            .map(|(template, _)| template.clone());
        if let Some(next) = next {
            self.render(&state, &next).await;
            state.current = Some(next);
        }
    }

    /// Step to the previous entry; no-op at the start.
    pub async fn button_prev(&self) {
        let mut state = self.state.lock().await;
        let Some(current) = state.current.clone() else {
            return;
        };
        let previous = state
            .entries
            .range((Bound::Unbounded, Bound::Excluded(&current)))
            .next_back()
            .map(|(template, _)| template.clone());
        if let Some(previous) = previous {
            self.render(&state, &previous).await;
            state.current = Some(previous);
        }
    }

    // ── Introspection (tests, admin surface) ─────────────────────────

    pub async fn current_template(&self) -> Option<DisplayTemplate> {
        self.state.lock().await.current.clone()
    }

    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn remove_templates(&self, state: &mut BusState, doomed: Vec<DisplayTemplate>) {
        if doomed.is_empty() {
            return;
        }
        let anchor = match &state.current {
            Some(current) if doomed.contains(current) => current.clone(),
            _ => {
                for template in &doomed {
                    state.entries.remove(template);
                }
                return;
            }
        };
        for template in &doomed {
            state.entries.remove(template);
        }

        // The shown entry went away: next in order, else previous, else
        // back to the banner.
        let replacement = state
            .entries
            .range((Bound::Excluded(&anchor), Bound::Unbounded))
            .next()
            .map(|(template, _)| template.clone())
            .or_else(|| {
                state
                    .entries
                    .range((Bound::Unbounded, Bound::Excluded(&anchor)))
                    .next_back()
                    .map(|(template, _)| template.clone())
            });
        match replacement {
            Some(template) => {
                self.render(state, &template).await;
                state.current = Some(template);
            }
            None => {
                state.current = None;
                self.boot().await;
            }
        }
    }

    async fn render(&self, state: &BusState, template: &DisplayTemplate) {
        let value = state.entries.get(template).copied().unwrap_or(0.0);
        let (line1, line2) = if template.prediction {
            let actual = state
                .entries
                .get(&template.paired_load())
                .copied()
                .unwrap_or(0.0);
            let trend = TrafficState::derive(value, actual, self.designator, self.link_bandwidth);
            format::prediction_lines(self.smoothing_range_ms, template, value, trend)
        } else {
            format::mean_lines(self.smoothing_range_ms, template, value)
        };

        if let Err(error) = self.driver.write_lines(&line1, &line2).await {
            warn!(%error, "LCD update failed");
        }
        let (red, green, blue) = color::load_color(value, self.link_bandwidth);
        if let Err(error) = self.driver.set_color(red, green, blue).await {
            warn!(%error, "LED update failed");
        }
    }
}
