//! Small enums shared by steps, the engine and the overlay
//!
//! All of them round-trip through strings (strum) so tour definitions and
//! logs stay readable.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Where a step sits in its tour, derived from its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StepPosition {
    First,
    InBetween,
    Last,
    /// The single step of a one-step tour: both first and last
    Only,
}

impl StepPosition {
    /// Classify step `index` of a tour with `count` steps
    pub fn classify(index: usize, count: usize) -> Self {
        let first = index == 0;
        let last = index + 1 >= count;
        match (first, last) {
            (true, true) => Self::Only,
            (true, false) => Self::First,
            (false, true) => Self::Last,
            (false, false) => Self::InBetween,
        }
    }

    pub const fn is_first(self) -> bool {
        matches!(self, Self::First | Self::Only)
    }

    pub const fn is_last(self) -> bool {
        matches!(self, Self::Last | Self::Only)
    }
}

/// Engine operation a button triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngineAction {
    Cancel,
    Back,
    Next,
    Complete,
}

/// Visual weight of a navigation button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Display, EnumString)]
pub enum ButtonStyle {
    #[default]
    #[strum(serialize = "tour-button-primary")]
    Primary,
    #[strum(serialize = "tour-button-secondary")]
    Secondary,
}

/// Side of the target a step bubble attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_classify_positions() {
        assert_eq!(StepPosition::classify(0, 3), StepPosition::First);
        assert_eq!(StepPosition::classify(1, 3), StepPosition::InBetween);
        assert_eq!(StepPosition::classify(2, 3), StepPosition::Last);
        assert_eq!(StepPosition::classify(0, 1), StepPosition::Only);
    }

    #[test]
    fn test_only_is_first_and_last() {
        assert!(StepPosition::Only.is_first());
        assert!(StepPosition::Only.is_last());
        assert!(!StepPosition::InBetween.is_first());
        assert!(!StepPosition::InBetween.is_last());
    }

    #[test]
    fn test_engine_action_strings() {
        assert_eq!(EngineAction::Complete.to_string(), "complete");
        assert_eq!(EngineAction::from_str("back").unwrap(), EngineAction::Back);
    }

    #[test]
    fn test_button_style_class_names() {
        assert_eq!(ButtonStyle::Secondary.to_string(), "tour-button-secondary");
        assert_eq!(ButtonStyle::default(), ButtonStyle::Primary);
    }
}
