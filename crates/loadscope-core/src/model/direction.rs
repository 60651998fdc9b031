use serde::{Deserialize, Serialize};

/// Flow direction relative to the monitored device.
///
/// Derived once from the inner source MAC at classification time and
/// immutable afterwards. Persisted as 0 (RX) / 1 (TX).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Rx,
    Tx,
}

impl Direction {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Rx => 0,
            Self::Tx => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Rx),
            1 => Some(Self::Tx),
            _ => None,
        }
    }

    /// Two-letter label used on the LCD.
    pub fn label(self) -> &'static str {
        match self {
            Self::Rx => "RX",
            Self::Tx => "TX",
        }
    }
}

/// Trend of the predicted load against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficState {
    Steady,
    Rising,
    Dropping,
}

impl TrafficState {
    /// Classify a prediction against the actual load.
    ///
    /// The band is `actual ± actual * designator`, clamped to
    /// `[0, link_bandwidth]`.
    pub fn derive(predicted: f64, actual: f64, designator: f64, link_bandwidth: u64) -> Self {
        let low = (actual - actual * designator).max(0.0);
        let high = (actual + actual * designator).min(link_bandwidth as f64);
        if predicted >= low && predicted <= high {
            Self::Steady
        } else if predicted < low {
            Self::Dropping
        } else {
            Self::Rising
        }
    }

    /// Single-character marker shown on the prediction line.
    pub fn symbol(self) -> char {
        match self {
            Self::Steady => 'S',
            Self::Rising => 'R',
            Self::Dropping => 'D',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_u8() {
        assert_eq!(Direction::from_u8(0), Some(Direction::Rx));
        assert_eq!(Direction::from_u8(1), Some(Direction::Tx));
        assert_eq!(Direction::from_u8(2), None);
        assert_eq!(Direction::Tx.as_u8(), 1);
    }

    #[test]
    fn state_band_boundaries() {
        // actual=400, designator=0.05 -> band [380, 420]
        assert_eq!(
            TrafficState::derive(420.0, 400.0, 0.05, 10_000),
            TrafficState::Steady
        );
        assert_eq!(
            TrafficState::derive(421.0, 400.0, 0.05, 10_000),
            TrafficState::Rising
        );
        assert_eq!(
            TrafficState::derive(379.0, 400.0, 0.05, 10_000),
            TrafficState::Dropping
        );
    }

    #[test]
    fn state_band_is_clamped_to_link() {
        // Lower bound clamps to zero.
        assert_eq!(
            TrafficState::derive(0.0, 0.0, 0.5, 1_000),
            TrafficState::Steady
        );
        // Upper bound clamps to the bandwidth.
        assert_eq!(
            TrafficState::derive(1_000.0, 990.0, 0.5, 1_000),
            TrafficState::Steady
        );
        assert_eq!(
            TrafficState::derive(1_001.0, 990.0, 0.5, 1_000),
            TrafficState::Rising
        );
    }
}
