//! Loiterwatch: presence/loitering detector
//!
//! A distance reading is classified against a presence band, fed into the
//! loitering monitor (hysteresis timers + alarm state machine) and the
//! resulting state drives an indicator LED, a buzzer and status text sinks.
//!
//! sensor → PresenceBand → LoiteringMonitor → ActionDispatcher → writers

pub mod core;
pub mod hw;
pub mod types;

// =============================================================================
// PRESENCE BAND - default target window (centimeters)
// =============================================================================

/// Closest distance still counted as a loitering target
pub const DEFAULT_MIN_DISTANCE_CM: f64 = 60.0;

/// Farthest distance still counted as a loitering target
pub const DEFAULT_MAX_DISTANCE_CM: f64 = 120.0;

// =============================================================================
// HYSTERESIS - default timing (seconds)
// =============================================================================

/// Continuous presence required before the alarm fires (5 minutes)
pub const DEFAULT_ALERT_AFTER_SECS: f64 = 5.0 * 60.0;

/// Absence grace period before the monitor resets to idle
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Duration of one tick of the control loop
pub const DEFAULT_RESOLUTION_SECS: f64 = 0.5;

// =============================================================================
// INDICATOR - default flash rates (Hz)
// =============================================================================

/// Fast flash while a target is being timed
pub const DEFAULT_FREQ_DETECTED_HZ: f64 = 10.0;

/// Slow flash while the target is out of sight
pub const DEFAULT_FREQ_OCCLUDED_HZ: f64 = 2.0;

// =============================================================================
// BUZZER - passive (PWM) defaults
// =============================================================================

/// Tone frequency for a passive buzzer
pub const DEFAULT_BUZZER_FREQ_HZ: u32 = 5000;

/// PWM duty cycle for a passive buzzer
pub const DEFAULT_BUZZER_DUTY: f32 = 0.5;

// =============================================================================
// RANGER - HC-SR04 style ultrasonic sensor
// =============================================================================

/// Upper bound on a single echo wait (microseconds)
pub const DEFAULT_ECHO_TIMEOUT_US: u32 = 10_000;

/// Length of the trigger pulse (microseconds)
pub const TRIGGER_PULSE_US: u32 = 10;

/// Speed of sound at room temperature (cm per microsecond)
pub const SPEED_OF_SOUND_CM_PER_US: f64 = 0.0343;

// =============================================================================
// DISPLAY - 2 x 8 character LCD
// =============================================================================

pub const LCD_ROWS: usize = 2;
pub const LCD_COLUMNS: usize = 8;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
