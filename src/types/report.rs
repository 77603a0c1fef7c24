//! Per-tick status payload handed to the writers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::State;

/// Snapshot of the monitor after one processed tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// When the tick was processed
    pub timestamp: DateTime<Utc>,
    /// Distance reading for this tick (cm)
    pub distance_cm: f64,
    /// Monitor state after the update
    pub state: State,
    /// Seconds until the alarm fires
    pub time_to_alert: f64,
    /// Seconds until the monitor resets (full timeout when not counting down)
    pub time_to_reset: f64,
}

impl StatusReport {
    /// Create a report stamped with the current time
    pub fn new(distance_cm: f64, state: State, time_to_alert: f64, time_to_reset: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            distance_cm,
            state,
            time_to_alert,
            time_to_reset,
        }
    }
}
