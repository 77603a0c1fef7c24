//! Buzzer driver: active (plain pin) or passive (PWM tone) wiring

use std::time::Duration;

use crate::hw::{AlarmOutput, OutputPin, Pacer, PwmChannel};
use crate::types::{BuzzerConfig, ConfigError, ConfigResult, Pulse};

/// Optional tone override for one beep
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tone {
    pub freq_hz: Option<u32>,
    pub duty: Option<f32>,
}

impl From<&Pulse> for Tone {
    fn from(pulse: &Pulse) -> Self {
        Self {
            freq_hz: pulse.freq_hz(),
            duty: pulse.duty(),
        }
    }
}

/// How the buzzer is physically energized
pub trait BuzzerDrive {
    fn energize(&mut self, tone: Tone);
    fn silence(&mut self);
    fn is_energized(&self) -> bool;
}

/// Self-oscillating buzzer on a digital pin; tones are ignored
#[derive(Debug)]
pub struct ActiveDrive<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> ActiveDrive<P> {
    /// Create drive on a digital pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> BuzzerDrive for ActiveDrive<P> {
    fn energize(&mut self, _tone: Tone) {
        self.pin.set_high();
    }

    fn silence(&mut self) {
        self.pin.set_low();
    }

    fn is_energized(&self) -> bool {
        self.pin.is_set_high()
    }
}

/// Piezo driven by a PWM channel
#[derive(Debug)]
pub struct PassiveDrive<W: PwmChannel> {
    pwm: W,
    freq_hz: u32,
    duty: f32,
}

impl<W: PwmChannel> PassiveDrive<W> {
    /// Create drive with the configured tone, initially silent
    pub fn new(mut pwm: W, config: &BuzzerConfig) -> ConfigResult<Self> {
        config.validate()?;
        pwm.set_frequency(config.freq_hz);
        pwm.set_duty(0.0);
        Ok(Self {
            pwm,
            freq_hz: config.freq_hz,
            duty: config.duty,
        })
    }

    pub fn pwm(&self) -> &W {
        &self.pwm
    }
}

impl<W: PwmChannel> BuzzerDrive for PassiveDrive<W> {
    fn energize(&mut self, tone: Tone) {
        self.pwm.set_frequency(tone.freq_hz.unwrap_or(self.freq_hz));
        self.pwm.set_duty(tone.duty.unwrap_or(self.duty));
    }

    fn silence(&mut self) {
        self.pwm.set_duty(0.0);
    }

    fn is_energized(&self) -> bool {
        self.pwm.duty() > 0.0
    }
}

/// Alarm buzzer
#[derive(Debug)]
pub struct Buzzer<D: BuzzerDrive, W: Pacer> {
    drive: D,
    pacer: W,
}

impl<D: BuzzerDrive, W: Pacer> Buzzer<D, W> {
    /// Create buzzer, initially off
    pub fn new(drive: D, pacer: W) -> Self {
        Self { drive, pacer }
    }

    /// Sound for `duration_ms`, then fall silent
    pub fn beep(&mut self, duration_ms: u32, tone: Tone) -> ConfigResult<()> {
        if duration_ms == 0 {
            return Err(ConfigError::invalid("duration_ms", "must be positive"));
        }
        self.drive.energize(tone);
        self.pacer.wait(Duration::from_millis(duration_ms as u64));
        self.drive.silence();
        Ok(())
    }

    /// Play a validated pattern; pulses cannot fail
    pub fn play(&mut self, pulses: &[Pulse]) {
        for pulse in pulses {
            self.drive.energize(Tone::from(pulse));
            self.pacer.wait(Duration::from_millis(pulse.duration_ms() as u64));
            self.drive.silence();
            if pulse.rest_ms() > 0 {
                self.pacer.wait(Duration::from_millis(pulse.rest_ms() as u64));
            }
        }
    }

    /// Underlying drive
    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn pacer(&self) -> &W {
        &self.pacer
    }
}

impl<D: BuzzerDrive, W: Pacer> AlarmOutput for Buzzer<D, W> {
    fn on(&mut self) {
        self.drive.energize(Tone::default());
    }

    fn off(&mut self) {
        self.drive.silence();
    }

    fn is_on(&self) -> bool {
        self.drive.is_energized()
    }
}
