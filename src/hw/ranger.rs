//! Ultrasonic ranging (HC-SR04 style): trigger pulse, then time the echo

use tracing::debug;

use crate::hw::DistanceSensor;
use crate::types::SensorError;
use crate::{DEFAULT_ECHO_TIMEOUT_US, SPEED_OF_SOUND_CM_PER_US, TRIGGER_PULSE_US};

/// Pin-level access to the ranger
pub trait EchoTimer {
    /// Drive the trigger line high for `pulse_us`
    fn trigger(&mut self, pulse_us: u32);

    /// Length of the echo pulse in µs, negative if none arrived in `timeout_us`
    fn time_echo_us(&mut self, timeout_us: u32) -> i64;

    /// Recorded front ends run out; real hardware never does
    fn exhausted(&self) -> bool {
        false
    }
}

/// Convert a round-trip echo time to a one-way distance
pub fn echo_to_distance_cm(echo_us: i64) -> Result<f64, SensorError> {
    if echo_us < 0 {
        return Err(SensorError::EchoTimeout);
    }
    Ok(echo_us as f64 * SPEED_OF_SOUND_CM_PER_US / 2.0)
}

/// Round-trip echo time for a target at `distance_cm`
pub fn distance_to_echo_us(distance_cm: f64) -> i64 {
    (distance_cm * 2.0 / SPEED_OF_SOUND_CM_PER_US).round() as i64
}

/// Farthest target whose echo returns within `echo_timeout_us`
pub fn max_range_cm(echo_timeout_us: u32) -> f64 {
    f64::from(echo_timeout_us) * SPEED_OF_SOUND_CM_PER_US / 2.0
}

/// Distance sensor built on an [`EchoTimer`]
#[derive(Debug)]
pub struct EchoRanger<E: EchoTimer> {
    timer: E,
    echo_timeout_us: u32,
}

impl<E: EchoTimer> EchoRanger<E> {
    /// Ranger with the stock 10 ms echo timeout
    pub fn new(timer: E) -> Self {
        Self::with_timeout(timer, DEFAULT_ECHO_TIMEOUT_US)
    }

    /// Ranger that gives up after `echo_timeout_us`
    pub fn with_timeout(timer: E, echo_timeout_us: u32) -> Self {
        Self {
            timer,
            echo_timeout_us,
        }
    }

    pub fn timer(&self) -> &E {
        &self.timer
    }

    /// Echo wait limit (µs)
    pub fn echo_timeout_us(&self) -> u32 {
        self.echo_timeout_us
    }
}

impl<E: EchoTimer> DistanceSensor for EchoRanger<E> {
    fn read_cm(&mut self) -> Result<f64, SensorError> {
        if self.timer.exhausted() {
            return Err(SensorError::Exhausted);
        }
        self.timer.trigger(TRIGGER_PULSE_US);
        let echo_us = self.timer.time_echo_us(self.echo_timeout_us);
        let reading = echo_to_distance_cm(echo_us);
        if reading.is_err() {
            debug!(timeout_us = self.echo_timeout_us, "no echo");
        }
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTimer {
        echoes: Vec<i64>,
        triggers: Vec<u32>,
        timeouts: Vec<u32>,
    }

    impl EchoTimer for FakeTimer {
        fn trigger(&mut self, pulse_us: u32) {
            self.triggers.push(pulse_us);
        }

        fn time_echo_us(&mut self, timeout_us: u32) -> i64 {
            self.timeouts.push(timeout_us);
            self.echoes.remove(0)
        }
    }

    #[test]
    fn test_echo_conversion() {
        assert_eq!(echo_to_distance_cm(0), Ok(0.0));
        let d = echo_to_distance_cm(5831).unwrap();
        assert!((d - 100.0).abs() < 0.01, "got {}", d);
        assert_eq!(echo_to_distance_cm(-1), Err(SensorError::EchoTimeout));
        assert_eq!(distance_to_echo_us(100.0), 5831);
    }

    #[test]
    fn test_max_range_follows_timeout() {
        assert!((max_range_cm(DEFAULT_ECHO_TIMEOUT_US) - 171.5).abs() < 1e-9);
        assert!(max_range_cm(25_000) > max_range_cm(DEFAULT_ECHO_TIMEOUT_US));
    }

    #[test]
    fn test_ranger_triggers_and_bounds_wait() {
        let timer = FakeTimer {
            echoes: vec![5831, -1],
            triggers: vec![],
            timeouts: vec![],
        };
        let mut ranger = EchoRanger::with_timeout(timer, 25_000);

        assert!(ranger.read_cm().is_ok());
        assert_eq!(ranger.read_cm(), Err(SensorError::EchoTimeout));
        assert_eq!(ranger.timer.triggers, vec![TRIGGER_PULSE_US; 2]);
        assert_eq!(ranger.timer.timeouts, vec![25_000; 2]);
    }
}
