//! Action dispatcher: monitor state → LED pattern + buzzer
//!
//! - IDLE:     LED steady, buzzer off
//! - DETECTED: fast flash once two ticks are in (first tick holds), buzzer off
//! - OCCLUDED: slow flash, buzzer off
//! - ALARM:    alarm flash, buzzer on
//! - ARMED:    armed flash, buzzer left as it is
//!
//! Every action takes exactly one resolution of wall-clock time.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::monitor::LoiteringMonitor;
use crate::hw::{AlarmOutput, Indicator, Pacer};
use crate::types::State;

/// What the dispatcher did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Steady,
    /// First DETECTED tick: no flash yet
    Hold,
    FlashDetected,
    FlashOccluded,
    FlashAlarm,
    FlashArmed,
}

/// Owns the indicator, the alarm output and the pacer for idle waits
#[derive(Debug)]
pub struct ActionDispatcher<I: Indicator, A: AlarmOutput, W: Pacer> {
    indicator: I,
    alarm: A,
    pacer: W,
}

impl<I: Indicator, A: AlarmOutput, W: Pacer> ActionDispatcher<I, A, W> {
    /// Create dispatcher
    pub fn new(indicator: I, alarm: A, pacer: W) -> Self {
        Self {
            indicator,
            alarm,
            pacer,
        }
    }

    /// Run the action for the monitor's current state
    pub fn dispatch(&mut self, monitor: &LoiteringMonitor) -> Action {
        let tick = Duration::from_secs_f64(monitor.resolution());
        let action = select_action(monitor.state(), monitor.elapsed_ticks());

        match action {
            Action::Steady => {
                self.indicator.on();
                self.alarm.off();
                self.pacer.wait(tick);
            }
            Action::Hold => {
                self.pacer.wait(tick);
                self.alarm.off();
            }
            Action::FlashDetected => {
                self.indicator.flash_detected(tick);
                self.alarm.off();
            }
            Action::FlashOccluded => {
                self.indicator.flash_occluded(tick);
                self.alarm.off();
            }
            Action::FlashAlarm => {
                self.indicator.flash_alarm(tick);
                self.alarm.on();
            }
            Action::FlashArmed => {
                self.indicator.flash_armed(tick);
            }
        }

        debug!(state = %monitor.state(), ?action, buzzer = self.alarm.is_on(), "dispatched");
        action
    }

    /// Get indicator
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Get alarm output
    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    /// Pacer used for waits without a flash
    pub fn pacer(&self) -> &W {
        &self.pacer
    }
}

/// DETECTED only flashes after at least two consecutive ticks
pub fn select_action(state: State, elapsed_ticks: u64) -> Action {
    match state {
        State::Idle => Action::Steady,
        State::Detected if elapsed_ticks >= 2 => Action::FlashDetected,
        State::Detected => Action::Hold,
        State::Occluded => Action::FlashOccluded,
        State::Alarm => Action::FlashAlarm,
        State::Armed => Action::FlashArmed,
    }
}
