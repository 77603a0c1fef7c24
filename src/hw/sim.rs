//! Simulated peripherals for host runs and tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::BufRead;
use std::rc::Rc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{trace, warn};

use crate::hw::{
    distance_to_echo_us, echo_to_distance_cm, DistanceSensor, EchoTimer, OutputPin, Pacer,
    PwmChannel, TextSink,
};
use crate::types::{SensorError, SinkError};

lazy_static! {
    /// `42.3` or `42.3 cm`
    static ref RE_DISTANCE: Regex = Regex::new(
        r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:cm)?\s*$"
    ).unwrap();

    /// `echo 2466` or `echo 2466 us` (raw echo time; negative = timeout)
    static ref RE_ECHO: Regex = Regex::new(
        r"(?i)^\s*echo\s+(-?\d+)\s*(?:us)?\s*$"
    ).unwrap();

    /// `-`, `none`, `timeout` or a blank line
    static ref RE_NO_READING: Regex = Regex::new(
        r"(?i)^\s*(?:-|none|timeout)?\s*$"
    ).unwrap();
}

// =============================================================================
// PINS
// =============================================================================

/// Output pin that only remembers its level
#[derive(Debug, Clone)]
pub struct SimPin {
    name: &'static str,
    high: bool,
    edges: u64,
}

impl SimPin {
    /// Create pin, initially low
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            high: false,
            edges: 0,
        }
    }

    /// Number of level changes so far
    pub fn edges(&self) -> u64 {
        self.edges
    }

    fn set(&mut self, high: bool) {
        if self.high != high {
            self.edges += 1;
            trace!(pin = self.name, high, "edge");
        }
        self.high = high;
    }
}

impl OutputPin for SimPin {
    fn set_high(&mut self) {
        self.set(true);
    }

    fn set_low(&mut self) {
        self.set(false);
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// PWM channel that only remembers its settings
#[derive(Debug, Clone, Default)]
pub struct SimPwm {
    frequency: u32,
    duty: f32,
}

impl SimPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }
}

impl PwmChannel for SimPwm {
    fn set_frequency(&mut self, hz: u32) {
        self.frequency = hz;
    }

    fn set_duty(&mut self, duty: f32) {
        trace!(duty, "pwm duty");
        self.duty = duty;
    }

    fn duty(&self) -> f32 {
        self.duty
    }
}

// =============================================================================
// PACERS
// =============================================================================

/// Blocks the thread for real
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn wait(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Accumulates virtual time without blocking
#[derive(Debug, Clone, Default)]
pub struct VirtualPacer {
    elapsed: Duration,
    waits: u64,
}

impl VirtualPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time waited
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of `wait` calls
    pub fn waits(&self) -> u64 {
        self.waits
    }
}

impl Pacer for VirtualPacer {
    fn wait(&mut self, duration: Duration) {
        self.elapsed += duration;
        self.waits += 1;
    }
}

// =============================================================================
// DISTANCE SOURCES
// =============================================================================

/// Replays a fixed list of readings (`None` = echo timeout)
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    readings: VecDeque<Result<f64, SensorError>>,
}

impl ScriptedSensor {
    /// Create from readings, `None` meaning no echo
    pub fn new<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self {
            readings: readings
                .into_iter()
                .map(|r| r.ok_or(SensorError::EchoTimeout))
                .collect(),
        }
    }

    /// Create from explicit results
    pub fn from_results<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Result<f64, SensorError>>,
    {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl DistanceSensor for ScriptedSensor {
    fn read_cm(&mut self) -> Result<f64, SensorError> {
        self.readings.pop_front().unwrap_or(Err(SensorError::Exhausted))
    }
}

/// Ultrasonic front end over a list of target distances (`None` = nothing
/// reflects). Targets past the echo timeout read as timeouts.
#[derive(Debug, Clone, Default)]
pub struct SimEchoTimer {
    targets: VecDeque<Option<f64>>,
    triggers: u64,
}

impl SimEchoTimer {
    /// Create from target distances (cm)
    pub fn new<I>(targets: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self {
            targets: targets.into_iter().collect(),
            triggers: 0,
        }
    }

    pub fn triggers(&self) -> u64 {
        self.triggers
    }
}

impl EchoTimer for SimEchoTimer {
    fn trigger(&mut self, pulse_us: u32) {
        self.triggers += 1;
        trace!(pulse_us, "trigger");
    }

    fn time_echo_us(&mut self, timeout_us: u32) -> i64 {
        match self.targets.pop_front().flatten() {
            Some(distance_cm) => {
                let echo_us = distance_to_echo_us(distance_cm);
                if echo_us > i64::from(timeout_us) {
                    -1
                } else {
                    echo_us
                }
            }
            None => -1,
        }
    }

    fn exhausted(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Parse one script line. `None` for comments (`# ...`), which are not ticks.
pub fn parse_reading(line: &str) -> Option<Result<f64, SensorError>> {
    if line.trim_start().starts_with('#') {
        return None;
    }

    if let Some(caps) = RE_DISTANCE.captures(line) {
        return Some(
            caps[1]
                .parse::<f64>()
                .map_err(|e| SensorError::Malformed(e.to_string())),
        );
    }

    if let Some(caps) = RE_ECHO.captures(line) {
        return Some(match caps[1].parse::<i64>() {
            Ok(echo_us) => echo_to_distance_cm(echo_us),
            Err(e) => Err(SensorError::Malformed(e.to_string())),
        });
    }

    if RE_NO_READING.is_match(line) {
        return Some(Err(SensorError::EchoTimeout));
    }

    Some(Err(SensorError::Malformed(line.trim().to_string())))
}

/// One reading per line from any buffered reader (file or stdin)
pub struct LineSensor<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> LineSensor<R> {
    /// Read from `reader` until EOF
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> DistanceSensor for LineSensor<R> {
    fn read_cm(&mut self) -> Result<f64, SensorError> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return Err(SensorError::Exhausted),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "reading script failed, closing source");
                    return Err(SensorError::Exhausted);
                }
            }
            if let Some(reading) = parse_reading(&self.line) {
                return reading;
            }
        }
    }
}

// =============================================================================
// TEXT SINKS
// =============================================================================

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

impl TextSink for SharedBuffer {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        self.lines.borrow_mut().push(text.to_string());
        Ok(())
    }
}
