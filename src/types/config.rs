//! Configuration: presence band, hysteresis timing, indicator and buzzer
//! parameters. Everything is validated before the control loop starts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, ConfigResult};
use crate::{
    DEFAULT_ALERT_AFTER_SECS, DEFAULT_BUZZER_DUTY, DEFAULT_BUZZER_FREQ_HZ,
    DEFAULT_ECHO_TIMEOUT_US, DEFAULT_FREQ_DETECTED_HZ, DEFAULT_FREQ_OCCLUDED_HZ,
    DEFAULT_MAX_DISTANCE_CM, DEFAULT_MIN_DISTANCE_CM, DEFAULT_RESOLUTION_SECS,
    DEFAULT_TIMEOUT_SECS,
};

fn require_positive(field: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(field, format!("must be positive, got {}", value)));
    }
    Ok(())
}

/// The pacer sleeps in `Duration`s, so a period must map onto a non-zero one
fn require_period(field: &'static str, seconds: f64) -> ConfigResult<()> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(period) if !period.is_zero() => Ok(()),
        _ => Err(ConfigError::invalid(
            field,
            format!("period of {} s is out of range", seconds),
        )),
    }
}

fn require_unit_interval(field: &'static str, value: f32) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(field, format!("must be between 0 and 1, got {}", value)));
    }
    Ok(())
}

// =============================================================================
// PRESENCE BAND
// =============================================================================

/// Inclusive [min, max] distance window that counts as "target in range"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceBand {
    min_cm: f64,
    max_cm: f64,
}

impl PresenceBand {
    /// Create band; `min_cm` must not exceed `max_cm`
    pub fn new(min_cm: f64, max_cm: f64) -> ConfigResult<Self> {
        if !min_cm.is_finite() || min_cm < 0.0 {
            return Err(ConfigError::invalid("min_distance_cm", "must be a non-negative number"));
        }
        if !max_cm.is_finite() || max_cm < min_cm {
            return Err(ConfigError::invalid(
                "max_distance_cm",
                format!("must be at least min_distance_cm ({})", min_cm),
            ));
        }
        Ok(Self { min_cm, max_cm })
    }

    /// Classify a reading. Both bounds count as in range.
    pub fn contains(&self, distance_cm: f64) -> bool {
        self.min_cm <= distance_cm && distance_cm <= self.max_cm
    }

    /// Lower bound (cm)
    pub fn min_cm(&self) -> f64 {
        self.min_cm
    }

    /// Upper bound (cm)
    pub fn max_cm(&self) -> f64 {
        self.max_cm
    }
}

// =============================================================================
// MONITOR TIMING
// =============================================================================

/// Thresholds and tick length for the loitering monitor (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub alert_after_seconds: f64,
    pub timeout_seconds: f64,
    pub resolution: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            alert_after_seconds: DEFAULT_ALERT_AFTER_SECS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            resolution: DEFAULT_RESOLUTION_SECS,
        }
    }
}

impl MonitorSettings {
    /// Create settings (unchecked until `validate`)
    pub fn new(alert_after_seconds: f64, timeout_seconds: f64, resolution: f64) -> Self {
        Self {
            alert_after_seconds,
            timeout_seconds,
            resolution,
        }
    }

    /// Reject non-positive or unrepresentable timings
    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("alert_after_seconds", self.alert_after_seconds)?;
        require_positive("timeout_seconds", self.timeout_seconds)?;
        require_positive("resolution", self.resolution)?;
        require_period("resolution", self.resolution)?;
        Ok(())
    }
}

// =============================================================================
// INDICATOR
// =============================================================================

/// LED flash frequencies per state (Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlashRates {
    pub detected_hz: f64,
    pub occluded_hz: f64,
    /// Falls back to `detected_hz`
    pub alarm_hz: Option<f64>,
    /// Falls back to `occluded_hz`
    pub armed_hz: Option<f64>,
}

impl Default for FlashRates {
    fn default() -> Self {
        Self {
            detected_hz: DEFAULT_FREQ_DETECTED_HZ,
            occluded_hz: DEFAULT_FREQ_OCCLUDED_HZ,
            alarm_hz: None,
            armed_hz: None,
        }
    }
}

impl FlashRates {
    /// Rate while a target is being timed
    pub fn detected(&self) -> f64 {
        self.detected_hz
    }

    /// Rate while waiting out the grace period
    pub fn occluded(&self) -> f64 {
        self.occluded_hz
    }

    /// Rate while the alarm sounds
    pub fn alarm(&self) -> f64 {
        self.alarm_hz.unwrap_or(self.detected_hz)
    }

    /// Rate while the alarm waits for the target
    pub fn armed(&self) -> f64 {
        self.armed_hz.unwrap_or(self.occluded_hz)
    }

    /// Reject rates the LED cannot toggle at
    pub fn validate(&self) -> ConfigResult<()> {
        let rates = [
            ("led.detected_hz", self.detected()),
            ("led.occluded_hz", self.occluded()),
            ("led.alarm_hz", self.alarm()),
            ("led.armed_hz", self.armed()),
        ];
        for (field, hz) in rates {
            require_positive(field, hz)?;
            // the LED toggles every half period
            require_period(field, 0.5 / hz)?;
        }
        Ok(())
    }
}

// =============================================================================
// BUZZER
// =============================================================================

/// Buzzer wiring: active buzzers only need a pin, passive ones a PWM tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuzzerConfig {
    pub active: bool,
    pub freq_hz: u32,
    pub duty: f32,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            active: false,
            freq_hz: DEFAULT_BUZZER_FREQ_HZ,
            duty: DEFAULT_BUZZER_DUTY,
        }
    }
}

impl BuzzerConfig {
    /// Reject a silent tone or a duty outside [0, 1]
    pub fn validate(&self) -> ConfigResult<()> {
        if self.freq_hz == 0 {
            return Err(ConfigError::invalid("buzzer.freq_hz", "must be positive"));
        }
        require_unit_interval("buzzer.duty", self.duty)
    }
}

/// One beep of a buzzer pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    duration_ms: u32,
    rest_ms: u32,
    freq_hz: Option<u32>,
    duty: Option<f32>,
}

impl Pulse {
    /// Create pulse; `None` tone fields use the buzzer's configured tone
    pub fn new(
        duration_ms: u32,
        rest_ms: u32,
        freq_hz: Option<u32>,
        duty: Option<f32>,
    ) -> ConfigResult<Self> {
        if duration_ms == 0 {
            return Err(ConfigError::invalid("duration_ms", "must be positive"));
        }
        if freq_hz == Some(0) {
            return Err(ConfigError::invalid("freq_hz", "must be positive"));
        }
        if let Some(duty) = duty {
            require_unit_interval("duty", duty)?;
        }
        Ok(Self {
            duration_ms,
            rest_ms,
            freq_hz,
            duty,
        })
    }

    /// Plain beep at the buzzer's default tone
    pub fn beep(duration_ms: u32, rest_ms: u32) -> ConfigResult<Self> {
        Self::new(duration_ms, rest_ms, None, None)
    }

    /// Sounding time
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Silence after the beep
    pub fn rest_ms(&self) -> u32 {
        self.rest_ms
    }

    pub fn freq_hz(&self) -> Option<u32> {
        self.freq_hz
    }

    pub fn duty(&self) -> Option<f32> {
        self.duty
    }
}

// =============================================================================
// ALARM CONFIG
// =============================================================================

/// Full configuration of one loitering alarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmConfig {
    pub min_distance_cm: f64,
    pub max_distance_cm: f64,
    pub alert_after_seconds: f64,
    pub timeout_seconds: f64,
    pub resolution: f64,
    /// Register the verbose serial writer
    pub debug: bool,
    pub echo_timeout_us: u32,
    pub led: FlashRates,
    pub buzzer: BuzzerConfig,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            min_distance_cm: DEFAULT_MIN_DISTANCE_CM,
            max_distance_cm: DEFAULT_MAX_DISTANCE_CM,
            alert_after_seconds: DEFAULT_ALERT_AFTER_SECS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            resolution: DEFAULT_RESOLUTION_SECS,
            debug: false,
            echo_timeout_us: DEFAULT_ECHO_TIMEOUT_US,
            led: FlashRates::default(),
            buzzer: BuzzerConfig::default(),
        }
    }
}

impl AlarmConfig {
    /// Deployed doorway setup: 75-145 cm, alarm after 5 minutes
    pub fn production() -> Self {
        Self {
            min_distance_cm: 75.0,
            max_distance_cm: 145.0,
            alert_after_seconds: 5.0 * 60.0,
            timeout_seconds: 30.0,
            ..Self::default()
        }
    }

    /// Bench setup: same band, short timers, serial output on
    pub fn bench() -> Self {
        Self {
            min_distance_cm: 75.0,
            max_distance_cm: 145.0,
            alert_after_seconds: 10.0,
            timeout_seconds: 5.0,
            debug: true,
            ..Self::default()
        }
    }

    /// Parse a JSON config; missing keys take defaults
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validated presence band
    pub fn presence_band(&self) -> ConfigResult<PresenceBand> {
        PresenceBand::new(self.min_distance_cm, self.max_distance_cm)
    }

    /// Timing settings for the monitor
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings::new(self.alert_after_seconds, self.timeout_seconds, self.resolution)
    }

    /// Check every section; called before the loop starts
    pub fn validate(&self) -> ConfigResult<()> {
        self.presence_band()?;
        self.monitor_settings().validate()?;
        if self.echo_timeout_us == 0 {
            return Err(ConfigError::invalid("echo_timeout_us", "must be positive"));
        }
        self.led.validate()?;
        self.buzzer.validate()?;
        Ok(())
    }
}
