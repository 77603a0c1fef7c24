//! Core types for Loiterwatch

mod config;
mod error;
mod report;
mod state;

pub use config::{AlarmConfig, BuzzerConfig, FlashRates, MonitorSettings, PresenceBand, Pulse};
pub use error::{ConfigError, ConfigResult, SensorError, SinkError};
pub use report::StatusReport;
pub use state::{Event, State};
