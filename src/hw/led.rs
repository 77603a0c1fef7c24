//! Status LED with one flash rate per monitor state

use std::time::Duration;

use crate::hw::{Indicator, OutputPin, Pacer};
use crate::types::{ConfigResult, FlashRates};

/// Drives a single LED pin. Every flash blocks for exactly its duration.
#[derive(Debug)]
pub struct LedController<P: OutputPin, W: Pacer> {
    pin: P,
    rates: FlashRates,
    pacer: W,
}

impl<P: OutputPin, W: Pacer> LedController<P, W> {
    /// Rates are validated here, before any flash can run
    pub fn new(pin: P, rates: FlashRates, pacer: W) -> ConfigResult<Self> {
        rates.validate()?;
        Ok(Self { pin, rates, pacer })
    }

    /// Toggle every half period for `duration`, then leave the LED off.
    /// A rate with no representable half period lights the LED once.
    pub fn pulse(&mut self, freq_hz: f64, duration: Duration) {
        let half_period = Duration::try_from_secs_f64(0.5 / freq_hz)
            .ok()
            .filter(|step| !step.is_zero())
            .unwrap_or(duration);
        let mut remaining = duration;
        self.pin.set_low();
        while !remaining.is_zero() {
            self.pin.toggle();
            let step = half_period.min(remaining);
            self.pacer.wait(step);
            remaining -= step;
        }
        self.pin.set_low();
    }

    /// Effective rates after fallbacks
    pub fn rates(&self) -> &FlashRates {
        &self.rates
    }

    /// Underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn pacer(&self) -> &W {
        &self.pacer
    }
}

impl<P: OutputPin, W: Pacer> Indicator for LedController<P, W> {
    fn on(&mut self) {
        self.pin.set_high();
    }

    fn flash_detected(&mut self, duration: Duration) {
        self.pulse(self.rates.detected(), duration);
    }

    fn flash_occluded(&mut self, duration: Duration) {
        self.pulse(self.rates.occluded(), duration);
    }

    fn flash_alarm(&mut self, duration: Duration) {
        self.pulse(self.rates.alarm(), duration);
    }

    fn flash_armed(&mut self, duration: Duration) {
        self.pulse(self.rates.armed(), duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::{SimPin, VirtualPacer};

    fn led(rates: FlashRates) -> LedController<SimPin, VirtualPacer> {
        LedController::new(SimPin::new("led"), rates, VirtualPacer::new()).unwrap()
    }

    #[test]
    fn test_flash_blocks_for_full_duration() {
        let mut led = led(FlashRates::default());
        led.flash_detected(Duration::from_millis(500));
        assert_eq!(led.pacer().elapsed(), Duration::from_millis(500));
        // 10 Hz over 0.5 s: ten half periods
        assert_eq!(led.pacer().waits(), 10);
        assert!(!led.pin().is_set_high());
    }

    #[test]
    fn test_slow_flash_has_fewer_edges() {
        let mut fast = led(FlashRates::default());
        let mut slow = led(FlashRates::default());
        fast.flash_alarm(Duration::from_millis(500));
        slow.flash_armed(Duration::from_millis(500));
        assert!(slow.pin().edges() < fast.pin().edges());
        assert_eq!(slow.pacer().elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_half_period_is_clipped() {
        let mut led = led(FlashRates::default());
        // 2 Hz → 250 ms half period
        led.flash_occluded(Duration::from_millis(600));
        assert_eq!(led.pacer().elapsed(), Duration::from_millis(600));
        assert_eq!(led.pacer().waits(), 3);
    }

    #[test]
    fn test_unrepresentable_rate_rejected_and_bounded() {
        let rates = FlashRates {
            detected_hz: 1e10,
            ..FlashRates::default()
        };
        assert!(LedController::new(SimPin::new("led"), rates, VirtualPacer::new()).is_err());

        let mut led = led(FlashRates::default());
        for freq_hz in [1e10, f64::INFINITY, 0.0, -3.0] {
            led.pulse(freq_hz, Duration::from_millis(500));
        }
        assert_eq!(led.pacer().elapsed(), Duration::from_secs(2));
        assert_eq!(led.pacer().waits(), 4);
        assert!(!led.pin().is_set_high());
    }

    #[test]
    fn test_alarm_uses_own_rate() {
        let rates = FlashRates {
            alarm_hz: Some(4.0),
            ..FlashRates::default()
        };
        let mut led = led(rates);
        led.flash_alarm(Duration::from_millis(500));
        assert_eq!(led.pacer().waits(), 4);
    }

    #[test]
    fn test_on_is_steady() {
        let mut led = led(FlashRates::default());
        led.on();
        assert!(led.pin().is_set_high());
        assert_eq!(led.pacer().waits(), 0);
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let rates = FlashRates {
            detected_hz: -1.0,
            ..FlashRates::default()
        };
        assert!(LedController::new(SimPin::new("led"), rates, VirtualPacer::new()).is_err());
    }
}
