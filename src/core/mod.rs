//! Core modules for Loiterwatch

pub mod alarm;
pub mod dispatcher;
pub mod machine;
pub mod monitor;
pub mod writers;

pub use alarm::{LoiteringAlarm, RunSummary, Tick};
pub use dispatcher::{select_action, Action, ActionDispatcher};
pub use machine::{StateMachine, TransitionTable};
pub use monitor::LoiteringMonitor;
pub use writers::{
    format_time, json_formatter, lcd_formatter, verbose_colored_formatter, verbose_formatter,
    Formatter, Writer,
};
