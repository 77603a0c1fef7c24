//! Loitering alarm: the control loop
//!
//! Per tick: read distance → classify against the band → monitor update →
//! dispatch action → write status. A tick without a reading is skipped
//! entirely.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::dispatcher::{Action, ActionDispatcher};
use crate::core::monitor::LoiteringMonitor;
use crate::core::writers::Writer;
use crate::hw::{AlarmOutput, DistanceSensor, Indicator, Pacer};
use crate::types::{PresenceBand, SensorError, State, StatusReport};

/// Outcome of one `step`
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Processed { report: StatusReport, action: Action },
    /// No reading: no timer advance, no action, no output
    Skipped(SensorError),
    /// Finite source ran out
    Exhausted,
}

/// Totals returned by `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: u64,
    pub skipped: u64,
    pub final_state: State,
}

/// One alarm instance: exclusively owns its sensor, monitor and outputs
pub struct LoiteringAlarm<S, I, A, W>
where
    S: DistanceSensor,
    I: Indicator,
    A: AlarmOutput,
    W: Pacer,
{
    sensor: S,
    band: PresenceBand,
    monitor: LoiteringMonitor,
    dispatcher: ActionDispatcher<I, A, W>,
    writers: Vec<Writer>,
    processed: u64,
    skipped: u64,
}

impl<S, I, A, W> LoiteringAlarm<S, I, A, W>
where
    S: DistanceSensor,
    I: Indicator,
    A: AlarmOutput,
    W: Pacer,
{
    /// Create alarm loop with no writers
    pub fn new(
        sensor: S,
        band: PresenceBand,
        monitor: LoiteringMonitor,
        dispatcher: ActionDispatcher<I, A, W>,
    ) -> Self {
        Self {
            sensor,
            band,
            monitor,
            dispatcher,
            writers: Vec::new(),
            processed: 0,
            skipped: 0,
        }
    }

    /// Register a status writer (builder style)
    pub fn with_writer(mut self, writer: Writer) -> Self {
        self.add_writer(writer);
        self
    }

    /// Register a status writer
    pub fn add_writer(&mut self, writer: Writer) {
        info!(writer = writer.name(), "status writer registered");
        self.writers.push(writer);
    }

    /// Perform one tick
    pub fn step(&mut self) -> Tick {
        let distance = match self.sensor.read_cm() {
            Ok(distance) => distance,
            Err(SensorError::Exhausted) => return Tick::Exhausted,
            Err(e) => {
                debug!(error = %e, "no reading, tick skipped");
                self.skipped += 1;
                return Tick::Skipped(e);
            }
        };

        let is_in_range = self.band.contains(distance);
        self.monitor.update(is_in_range);

        let action = self.dispatcher.dispatch(&self.monitor);

        let report = StatusReport::new(
            distance,
            self.monitor.state(),
            self.monitor.time_to_alert(),
            self.monitor.time_to_reset(),
        );
        for writer in &mut self.writers {
            writer.emit(&report);
        }

        self.processed += 1;
        Tick::Processed { report, action }
    }

    /// Loop until the source is exhausted. Hardware sources never are.
    pub fn run(&mut self) -> RunSummary {
        info!(
            min_cm = self.band.min_cm(),
            max_cm = self.band.max_cm(),
            alert_after = self.monitor.settings().alert_after_seconds,
            timeout = self.monitor.settings().timeout_seconds,
            resolution = self.monitor.resolution(),
            "loitering alarm started"
        );
        while self.step() != Tick::Exhausted {}
        let summary = self.summary();
        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            state = %summary.final_state,
            "distance source exhausted"
        );
        summary
    }

    /// Counts so far
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.processed,
            skipped: self.skipped,
            final_state: self.monitor.state(),
        }
    }

    /// Get current state
    pub fn state(&self) -> State {
        self.monitor.state()
    }

    /// Get monitor
    pub fn monitor(&self) -> &LoiteringMonitor {
        &self.monitor
    }

    /// Get dispatcher
    pub fn dispatcher(&self) -> &ActionDispatcher<I, A, W> {
        &self.dispatcher
    }

    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }
}
