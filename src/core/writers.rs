//! Status writers: a text sink paired with the formatter that feeds it

use colored::Colorize;
use tracing::warn;

use crate::hw::TextSink;
use crate::types::StatusReport;

/// Pure report → text conversion, chosen when the writer is built
pub type Formatter = fn(&StatusReport) -> String;

/// One registered output
pub struct Writer {
    name: &'static str,
    sink: Box<dyn TextSink>,
    formatter: Formatter,
}

impl Writer {
    /// Create writer
    pub fn new(name: &'static str, sink: Box<dyn TextSink>, formatter: Formatter) -> Self {
        Self {
            name,
            sink,
            formatter,
        }
    }

    /// Register only if the sink answers at startup
    pub fn if_available(
        name: &'static str,
        sink: Box<dyn TextSink>,
        formatter: Formatter,
    ) -> Option<Self> {
        if sink.is_available() {
            Some(Self::new(name, sink, formatter))
        } else {
            warn!(writer = name, "sink not available, not registering");
            None
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Format and emit; failures are logged and dropped
    pub fn emit(&mut self, report: &StatusReport) -> bool {
        let text = (self.formatter)(report);
        match self.sink.write(&text) {
            Ok(()) => true,
            Err(e) => {
                warn!(writer = self.name, error = %e, "status write failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer").field("name", &self.name).finish()
    }
}

/// Seconds as `MM:SS`, fractions truncated
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Multi-line diagnostic output
pub fn verbose_formatter(report: &StatusReport) -> String {
    format!(
        "Distance: {:.1} cm\nState: {}\nTime to alert: {}\nTime to reset: {}",
        report.distance_cm,
        report.state,
        format_time(report.time_to_alert),
        format_time(report.time_to_reset)
    )
}

/// Same as [`verbose_formatter`] with the state name colored
pub fn verbose_colored_formatter(report: &StatusReport) -> String {
    format!(
        "Distance: {:.1} cm\nState: {}\nTime to alert: {}\nTime to reset: {}",
        report.distance_cm,
        report.state.name().color(report.state.color()).bold(),
        format_time(report.time_to_alert),
        format_time(report.time_to_reset)
    )
}

/// Widest value each compact field can show
const LCD_MAX_DISTANCE_CM: f64 = 999.9;
const LCD_MAX_ALERT_SECS: f64 = 99.0 * 60.0 + 59.0;
const LCD_MAX_RESET_SECS: f64 = 99.0;

/// Two 8-column rows: `ddd.d SS` / `MM:SS rr`. Values too wide for their
/// field saturate at the field's maximum.
pub fn lcd_formatter(report: &StatusReport) -> String {
    format!(
        "{:5.1} {}\n{} {:02.0}",
        report.distance_cm.clamp(0.0, LCD_MAX_DISTANCE_CM),
        report.state.abbreviation(),
        format_time(report.time_to_alert.min(LCD_MAX_ALERT_SECS)),
        report.time_to_reset.round().clamp(0.0, LCD_MAX_RESET_SECS)
    )
}

/// One JSON object per line
pub fn json_formatter(report: &StatusReport) -> String {
    serde_json::to_string(report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::SharedBuffer;
    use crate::types::{SinkError, State};
    use pretty_assertions::assert_eq;

    fn report() -> StatusReport {
        StatusReport::new(42.3, State::Detected, 125.0, 30.0)
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(125.0), "02:05");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(300.0), "05:00");
    }

    #[test]
    fn test_lcd_formatter() {
        let text = lcd_formatter(&report());
        assert_eq!(text, " 42.3 DE\n02:05 30");
        for line in text.lines() {
            assert_eq!(line.chars().count(), 8);
        }
    }

    #[test]
    fn test_lcd_formatter_single_digit_reset() {
        let report = StatusReport::new(130.0, State::Armed, 0.0, 4.0);
        assert_eq!(lcd_formatter(&report), "130.0 AR\n00:00 04");
    }

    #[test]
    fn test_lcd_formatter_saturates_wide_values() {
        let report = StatusReport::new(42.3, State::Detected, 125.0, 120.0);
        assert_eq!(lcd_formatter(&report), " 42.3 DE\n02:05 99");

        let report = StatusReport::new(1234.5, State::Occluded, 7200.0, 99.6);
        let text = lcd_formatter(&report);
        assert_eq!(text, "999.9 OC\n99:59 99");
        for line in text.lines() {
            assert_eq!(line.chars().count(), 8);
        }
    }

    #[test]
    fn test_lcd_frame_shows_saturated_reset() {
        use crate::hw::CharacterLcd;

        let mut lcd = CharacterLcd::new().with_mirror(false);
        let report = StatusReport::new(42.3, State::Detected, 125.0, 120.0);
        lcd.write(&lcd_formatter(&report)).unwrap();
        assert_eq!(lcd.frame(), vec![" 42.3 DE".to_string(), "02:05 99".to_string()]);
    }

    #[test]
    fn test_verbose_formatter() {
        assert_eq!(
            verbose_formatter(&report()),
            "Distance: 42.3 cm\nState: detected\nTime to alert: 02:05\nTime to reset: 00:30"
        );
    }

    #[test]
    fn test_colored_formatter_keeps_content() {
        colored::control::set_override(false);
        assert_eq!(verbose_colored_formatter(&report()), verbose_formatter(&report()));
        colored::control::unset_override();
    }

    #[test]
    fn test_json_formatter() {
        let json: serde_json::Value = serde_json::from_str(&json_formatter(&report())).unwrap();
        assert_eq!(json["state"], "detected");
        assert_eq!(json["time_to_alert"], 125.0);
    }

    #[test]
    fn test_writer_emits_formatted_text() {
        let buffer = SharedBuffer::new();
        let mut writer = Writer::new("memory", Box::new(buffer.clone()), lcd_formatter);
        assert!(writer.emit(&report()));
        assert_eq!(buffer.last().unwrap(), " 42.3 DE\n02:05 30");
    }

    struct BrokenSink;

    impl TextSink for BrokenSink {
        fn write(&mut self, _text: &str) -> Result<(), SinkError> {
            Err(SinkError::Unavailable)
        }
    }

    #[test]
    fn test_failed_write_is_not_fatal() {
        let mut writer = Writer::new("broken", Box::new(BrokenSink), verbose_formatter);
        assert!(!writer.emit(&report()));
    }

    #[test]
    fn test_unavailable_sink_not_registered() {
        let lcd = crate::hw::CharacterLcd::disconnected();
        assert!(Writer::if_available("lcd", Box::new(lcd), lcd_formatter).is_none());
        assert!(Writer::if_available("serial", Box::new(SharedBuffer::new()), verbose_formatter).is_some());
    }
}
