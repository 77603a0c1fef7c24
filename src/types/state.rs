//! Monitor states and the events that move between them

use colored::Color;
use serde::{Deserialize, Serialize};

/// The five states of a loitering monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Nothing in range, counters held at zero
    Idle,
    /// Target in range, timing toward the alert
    Detected,
    /// Target lost, waiting out the grace period
    Occluded,
    /// Target present past the alert threshold
    Alarm,
    /// Was alarming, target left; returns to Alarm or times out to Idle
    Armed,
}

impl State {
    pub const ALL: [State; 5] = [
        State::Idle,
        State::Detected,
        State::Occluded,
        State::Alarm,
        State::Armed,
    ];

    /// Lowercase name used in status output
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Detected => "detected",
            State::Occluded => "occluded",
            State::Alarm => "alarm",
            State::Armed => "armed",
        }
    }

    /// First two letters, uppercased (fits the character display)
    pub fn abbreviation(&self) -> &'static str {
        match self {
            State::Idle => "ID",
            State::Detected => "DE",
            State::Occluded => "OC",
            State::Alarm => "AL",
            State::Armed => "AR",
        }
    }

    /// Terminal color for the verbose formatter
    pub fn color(&self) -> Color {
        match self {
            State::Idle => Color::BrightBlack,
            State::Detected => Color::Yellow,
            State::Occluded => Color::Cyan,
            State::Alarm => Color::Red,
            State::Armed => Color::Magenta,
        }
    }

    /// Is the occlusion counter running in this state?
    pub fn counts_occlusion(&self) -> bool {
        matches!(self, State::Occluded | State::Armed)
    }

    /// Does this state mean the target is continuously present?
    pub fn is_present(&self) -> bool {
        matches!(self, State::Detected | State::Alarm)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Reading fell inside the presence band
    TargetInRange,
    /// Reading fell outside the presence band
    TargetOutOfRange,
    /// Elapsed time reached the alert threshold
    AlertTimeReached,
    /// Occluded time reached the grace period
    OcclusionTimeout,
}

impl Event {
    pub const ALL: [Event; 4] = [
        Event::TargetInRange,
        Event::TargetOutOfRange,
        Event::AlertTimeReached,
        Event::OcclusionTimeout,
    ];

    /// Presence event for a classified reading
    pub fn presence(is_in_range: bool) -> Self {
        if is_in_range {
            Event::TargetInRange
        } else {
            Event::TargetOutOfRange
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Event::TargetInRange => "target in range",
            Event::TargetOutOfRange => "target out of range",
            Event::AlertTimeReached => "alert time reached",
            Event::OcclusionTimeout => "occlusion timeout",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviation_is_uppercased_prefix() {
        for state in State::ALL {
            assert_eq!(state.abbreviation(), state.name()[..2].to_uppercase());
        }
    }

    #[test]
    fn test_display_uses_lowercase_name() {
        assert_eq!(State::Armed.to_string(), "armed");
        assert_eq!(Event::OcclusionTimeout.to_string(), "occlusion timeout");
    }

    #[test]
    fn test_presence_event() {
        assert_eq!(Event::presence(true), Event::TargetInRange);
        assert_eq!(Event::presence(false), Event::TargetOutOfRange);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&State::Occluded).unwrap();
        assert_eq!(json, "\"occluded\"");
        let event: Event = serde_json::from_str("\"alert_time_reached\"").unwrap();
        assert_eq!(event, Event::AlertTimeReached);
    }
}
