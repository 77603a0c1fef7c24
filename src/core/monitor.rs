//! Loitering monitor: hysteresis timers driving the alarm state machine
//!
//! One `update` per tick, in this order:
//! 1. advance timers according to the state left by the previous tick
//! 2. feed the presence event
//! 3. feed ALERT_TIME_REACHED if elapsed ≥ alert threshold
//! 4. feed OCCLUSION_TIMEOUT if occluded ≥ timeout
//!
//! Counters are kept as whole ticks so they only ever move in steps of
//! `resolution`.

use tracing::{debug, info};

use crate::core::machine::{StateMachine, TransitionTable};
use crate::types::{ConfigResult, Event, MonitorSettings, State};

/// Tracks how long a target has loitered and how long it has been gone
#[derive(Debug, Clone)]
pub struct LoiteringMonitor {
    settings: MonitorSettings,
    machine: StateMachine,
    /// Ticks since the monitor last left IDLE
    elapsed_ticks: u64,
    /// Ticks spent without the target since it was last continuously present
    occluded_ticks: u64,
    update_count: u64,
}

impl LoiteringMonitor {
    /// Monitor with the standard loitering table
    pub fn new(settings: MonitorSettings) -> ConfigResult<Self> {
        Self::with_machine(settings, StateMachine::new(TransitionTable::loitering()))
    }

    /// Monitor driving a caller-supplied machine
    pub fn with_machine(settings: MonitorSettings, machine: StateMachine) -> ConfigResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            machine,
            elapsed_ticks: 0,
            occluded_ticks: 0,
            update_count: 0,
        })
    }

    /// Process one tick's presence classification
    pub fn update(&mut self, is_in_range: bool) {
        self.update_count += 1;

        self.advance_timers();

        self.feed(Event::presence(is_in_range));

        if self.elapsed_time() >= self.settings.alert_after_seconds {
            self.feed(Event::AlertTimeReached);
        }

        if self.occluded_time() >= self.settings.timeout_seconds {
            self.feed(Event::OcclusionTimeout);
        }

        // Entering IDLE this tick: counters read zero right away
        if self.state() == State::Idle {
            self.reset_timers();
        }
    }

    /// Step 1: driven by the state before this tick's events
    fn advance_timers(&mut self) {
        let state = self.state();
        if state == State::Idle {
            self.reset_timers();
            return;
        }

        self.elapsed_ticks += 1;

        if state.is_present() {
            self.occluded_ticks = 0;
        } else if state.counts_occlusion() {
            self.occluded_ticks += 1;
        }
    }

    fn reset_timers(&mut self) {
        self.elapsed_ticks = 0;
        self.occluded_ticks = 0;
    }

    fn feed(&mut self, event: Event) -> State {
        let before = self.machine.state();
        let after = self.machine.transition(event);
        if before != after {
            info!(
                from = %before,
                to = %after,
                event = %event,
                elapsed = self.elapsed_time(),
                occluded = self.occluded_time(),
                "state transition"
            );
        } else {
            debug!(state = %after, event = %event, "event ignored");
        }
        after
    }

    /// Get current state
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// Get settings
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Tick length (seconds)
    pub fn resolution(&self) -> f64 {
        self.settings.resolution
    }

    /// Ticks since the monitor last left IDLE
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Ticks without the target
    pub fn occluded_ticks(&self) -> u64 {
        self.occluded_ticks
    }

    /// Seconds since the monitor last left IDLE
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_ticks as f64 * self.settings.resolution
    }

    /// Seconds without the target
    pub fn occluded_time(&self) -> f64 {
        self.occluded_ticks as f64 * self.settings.resolution
    }

    /// Seconds until ALERT_TIME_REACHED, floored at zero
    pub fn time_to_alert(&self) -> f64 {
        (self.settings.alert_after_seconds - self.elapsed_time()).max(0.0)
    }

    /// Seconds until the occlusion timeout; the full timeout when not counting down
    pub fn time_to_reset(&self) -> f64 {
        if self.state().counts_occlusion() {
            (self.settings.timeout_seconds - self.occluded_time()).max(0.0)
        } else {
            self.settings.timeout_seconds
        }
    }

    /// Number of `update` calls
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(alert_after: f64, timeout: f64) -> LoiteringMonitor {
        LoiteringMonitor::new(MonitorSettings::new(alert_after, timeout, 0.5)).unwrap()
    }

    fn drive(monitor: &mut LoiteringMonitor, readings: &[bool]) -> Vec<State> {
        readings
            .iter()
            .map(|&in_range| {
                monitor.update(in_range);
                monitor.state()
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let m = monitor(2.0, 1.0);
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.elapsed_time(), 0.0);
        assert_eq!(m.time_to_alert(), 2.0);
        assert_eq!(m.time_to_reset(), 1.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(LoiteringMonitor::new(MonitorSettings::new(2.0, 1.0, 0.0)).is_err());
        assert!(LoiteringMonitor::new(MonitorSettings::new(0.0, 1.0, 0.5)).is_err());
        // a tick no pacer could ever sleep for
        assert!(LoiteringMonitor::new(MonitorSettings::new(2.0, 1.0, 1e20)).is_err());
    }

    #[test]
    fn test_escalates_on_fifth_tick() {
        let mut m = monitor(2.0, 5.0);
        let states = drive(&mut m, &[true; 5]);
        assert_eq!(
            states,
            vec![
                State::Detected,
                State::Detected,
                State::Detected,
                State::Detected,
                State::Alarm
            ]
        );
        assert_eq!(m.elapsed_time(), 2.0);
        assert_eq!(m.time_to_alert(), 0.0);
    }

    #[test]
    fn test_first_tick_does_not_advance_elapsed() {
        let mut m = monitor(2.0, 5.0);
        m.update(true);
        assert_eq!(m.state(), State::Detected);
        assert_eq!(m.elapsed_ticks(), 0);
        m.update(true);
        assert_eq!(m.elapsed_time(), 0.5);
    }

    #[test]
    fn test_occlusion_counter_lags_transition() {
        let mut m = monitor(10.0, 5.0);
        drive(&mut m, &[true, true]);
        // DETECTED -> OCCLUDED: this tick's advance was computed as DETECTED
        m.update(false);
        assert_eq!(m.state(), State::Occluded);
        assert_eq!(m.occluded_time(), 0.0);
        assert_eq!(m.time_to_reset(), 5.0);

        m.update(false);
        assert_eq!(m.occluded_time(), 0.5);
        assert_eq!(m.time_to_reset(), 4.5);
    }

    #[test]
    fn test_occlusion_timeout_resets_to_idle() {
        let mut m = monitor(10.0, 5.0);
        drive(&mut m, &[true, true, false]);
        assert_eq!(m.state(), State::Occluded);

        let ticks = (5.0_f64 / 0.5).ceil() as usize;
        let states = drive(&mut m, &vec![false; ticks]);
        assert!(states[..ticks - 1].iter().all(|&s| s == State::Occluded));
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.elapsed_time(), 0.0);
        assert_eq!(m.occluded_time(), 0.0);
    }

    #[test]
    fn test_return_before_timeout_clears_occlusion() {
        let mut m = monitor(10.0, 5.0);
        drive(&mut m, &[true, false, false, false]);
        assert_eq!(m.occluded_time(), 1.0);

        m.update(true);
        assert_eq!(m.state(), State::Detected);
        m.update(true);
        assert_eq!(m.occluded_time(), 0.0);
        // elapsed keeps counting through the occlusion
        assert_eq!(m.elapsed_time(), 2.5);
    }

    #[test]
    fn test_return_after_alert_threshold_goes_straight_to_alarm() {
        let mut m = monitor(2.0, 5.0);
        drive(&mut m, &[true, true, true, false, false]);
        assert_eq!(m.state(), State::Occluded);
        assert!(m.elapsed_time() >= 2.0);

        m.update(true);
        assert_eq!(m.state(), State::Alarm);
    }

    #[test]
    fn test_alarm_to_armed_and_back() {
        let mut m = monitor(2.0, 1.0);
        drive(&mut m, &[true; 5]);
        assert_eq!(m.state(), State::Alarm);

        m.update(false);
        assert_eq!(m.state(), State::Armed);
        assert_eq!(m.occluded_time(), 0.0);

        m.update(false);
        assert_eq!(m.state(), State::Armed);
        assert_eq!(m.time_to_reset(), 0.5);

        // occluded reaches the timeout on this tick, but ALARM ignores it
        m.update(true);
        assert_eq!(m.state(), State::Alarm);
        assert_eq!(m.occluded_time(), 1.0);

        m.update(true);
        assert_eq!(m.occluded_time(), 0.0);
        assert_eq!(m.state(), State::Alarm);
    }

    #[test]
    fn test_armed_times_out_to_idle() {
        let mut m = monitor(2.0, 1.0);
        drive(&mut m, &[true; 5]);
        let states = drive(&mut m, &[false, false, false]);
        assert_eq!(states, vec![State::Armed, State::Armed, State::Idle]);
        assert_eq!(m.elapsed_time(), 0.0);
        assert_eq!(m.time_to_alert(), 2.0);
    }

    #[test]
    fn test_idle_ignores_absence() {
        let mut m = monitor(2.0, 1.0);
        for _ in 0..10 {
            m.update(false);
            assert_eq!(m.state(), State::Idle);
            assert_eq!(m.elapsed_time(), 0.0);
        }
        assert_eq!(m.update_count(), 10);
    }

    #[test]
    fn test_ignored_event_does_not_touch_counters() {
        let mut m = monitor(10.0, 5.0);
        drive(&mut m, &[true, true, true]);
        let (elapsed, occluded) = (m.elapsed_ticks(), m.occluded_ticks());

        assert_eq!(m.feed(Event::OcclusionTimeout), State::Detected);
        assert_eq!(m.feed(Event::TargetInRange), State::Detected);
        assert_eq!(m.elapsed_ticks(), elapsed);
        assert_eq!(m.occluded_ticks(), occluded);

        let mut twin = monitor(10.0, 5.0);
        drive(&mut twin, &[true, true, true]);
        for in_range in [true, false, false, true] {
            m.update(in_range);
            twin.update(in_range);
            assert_eq!(m.state(), twin.state());
            assert_eq!(m.elapsed_ticks(), twin.elapsed_ticks());
            assert_eq!(m.occluded_ticks(), twin.occluded_ticks());
        }
    }

    #[test]
    fn test_fine_resolution_counts_exact_ticks() {
        let mut m = LoiteringMonitor::new(MonitorSettings::new(1.0, 1.0, 0.1)).unwrap();
        // entry tick + 10 ticks of 0.1 s
        let states = drive(&mut m, &[true; 11]);
        assert_eq!(states[9], State::Detected);
        assert_eq!(states[10], State::Alarm);
    }
}
