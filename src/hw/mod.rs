//! Hardware seam: capability traits the engine depends on, drivers built on
//! top of pin/PWM primitives, and simulated peripherals for host runs.

pub mod buzzer;
pub mod display;
pub mod led;
pub mod ranger;
pub mod sim;

use std::time::Duration;

use crate::types::{SensorError, SinkError};

pub use buzzer::{ActiveDrive, Buzzer, BuzzerDrive, PassiveDrive, Tone};
pub use display::{CharacterLcd, SerialConsole};
pub use led::LedController;
pub use ranger::{distance_to_echo_us, echo_to_distance_cm, max_range_cm, EchoRanger, EchoTimer};
pub use sim::{
    LineSensor, ScriptedSensor, SharedBuffer, SimEchoTimer, SimPin, SimPwm, ThreadPacer,
    VirtualPacer,
};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A digital output line
pub trait OutputPin {
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn is_set_high(&self) -> bool;

    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }
}

/// A PWM output (duty in [0, 1])
pub trait PwmChannel {
    fn set_frequency(&mut self, hz: u32);
    fn set_duty(&mut self, duty: f32);
    fn duty(&self) -> f32;
}

/// The only way the engine spends wall-clock time
pub trait Pacer {
    fn wait(&mut self, duration: Duration);
}

impl<T: Pacer + ?Sized> Pacer for Box<T> {
    fn wait(&mut self, duration: Duration) {
        (**self).wait(duration);
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Distance source. Must return within a bounded time.
pub trait DistanceSensor {
    fn read_cm(&mut self) -> Result<f64, SensorError>;
}

impl<T: DistanceSensor + ?Sized> DistanceSensor for Box<T> {
    fn read_cm(&mut self) -> Result<f64, SensorError> {
        (**self).read_cm()
    }
}

/// Status LED. Each flash blocks for `duration`.
pub trait Indicator {
    fn on(&mut self);
    fn flash_detected(&mut self, duration: Duration);
    fn flash_occluded(&mut self, duration: Duration);
    fn flash_alarm(&mut self, duration: Duration);
    fn flash_armed(&mut self, duration: Duration);
}

/// Alarm output (buzzer); the caller sets it every tick
pub trait AlarmOutput {
    fn on(&mut self);
    fn off(&mut self);
    fn is_on(&self) -> bool;
}

impl<T: AlarmOutput + ?Sized> AlarmOutput for Box<T> {
    fn on(&mut self) {
        (**self).on();
    }

    fn off(&mut self) {
        (**self).off();
    }

    fn is_on(&self) -> bool {
        (**self).is_on()
    }
}

/// Destination for formatted status text
pub trait TextSink {
    fn write(&mut self, text: &str) -> Result<(), SinkError>;

    /// Checked once at startup; unavailable sinks are never registered
    fn is_available(&self) -> bool {
        true
    }
}
