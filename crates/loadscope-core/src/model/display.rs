use std::cmp::Ordering;

use super::Direction;

/// Composite key of one renderable display entry.
///
/// `class_id` is the stable identity for updates and deletes; the name is
/// cosmetic and rewritten in place on rename. The total order drives
/// button navigation: name ascending, direction ascending, prediction
/// entries before their load counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTemplate {
    pub class_id: i64,
    pub class_name: String,
    pub direction: Direction,
    pub prediction: bool,
}

impl DisplayTemplate {
    pub fn load(class_id: i64, class_name: impl Into<String>, direction: Direction) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            direction,
            prediction: false,
        }
    }

    pub fn prediction(class_id: i64, class_name: impl Into<String>, direction: Direction) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            direction,
            prediction: true,
        }
    }

    /// The non-prediction entry this prediction is paired with.
    pub fn paired_load(&self) -> Self {
        Self {
            prediction: false,
            ..self.clone()
        }
    }
}

impl Ord for DisplayTemplate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.class_name
            .cmp(&other.class_name)
            .then(self.direction.cmp(&other.direction))
            // prediction=true sorts before false
            .then(other.prediction.cmp(&self.prediction))
            .then(self.class_id.cmp(&other.class_id))
    }
}

impl PartialOrd for DisplayTemplate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_name_direction_prediction() {
        let mut templates = vec![
            DisplayTemplate::load(2, "beta", Direction::Tx),
            DisplayTemplate::load(1, "alpha", Direction::Tx),
            DisplayTemplate::prediction(1, "alpha", Direction::Rx),
            DisplayTemplate::load(2, "beta", Direction::Rx),
            DisplayTemplate::load(1, "alpha", Direction::Rx),
        ];
        templates.sort();

        let shape: Vec<(&str, Direction, bool)> = templates
            .iter()
            .map(|t| (t.class_name.as_str(), t.direction, t.prediction))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("alpha", Direction::Rx, true),
                ("alpha", Direction::Rx, false),
                ("alpha", Direction::Tx, false),
                ("beta", Direction::Rx, false),
                ("beta", Direction::Tx, false),
            ]
        );
    }

    #[test]
    fn paired_load_drops_prediction_flag() {
        let prediction = DisplayTemplate::prediction(7, "dns", Direction::Rx);
        let load = prediction.paired_load();
        assert!(!load.prediction);
        assert_eq!(load.class_id, 7);
        assert_eq!(load.direction, Direction::Rx);
    }
}
