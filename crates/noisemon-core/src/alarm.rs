//! Alarm evaluation, threshold clamping and the buzzer output

use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use serde::Serialize;

use crate::config::{MAX_THRESHOLD_DB, MIN_THRESHOLD_DB};

/// Outcome of comparing a reading with the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlarmVerdict {
    Safe,
    Alarm,
}

impl AlarmVerdict {
    pub const fn is_alarm(self) -> bool {
        matches!(self, Self::Alarm)
    }

    /// Get the display label for this verdict
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Alarm => "Warn!",
        }
    }
}

/// Alarm when the reading is strictly above the threshold. Ties are safe.
pub fn evaluate(reading_db: f32, threshold_db: f32) -> AlarmVerdict {
    if reading_db > threshold_db {
        AlarmVerdict::Alarm
    } else {
        AlarmVerdict::Safe
    }
}

/// Inclusive range the alarm threshold is clamped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ThresholdLimits {
    fn default() -> Self {
        Self::new(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB)
    }
}

impl ThresholdLimits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Shift `current` by `delta` and clamp the result into the range.
    pub fn adjust(&self, current: f32, delta: f32) -> f32 {
        (current + delta).clamp(self.min, self.max)
    }
}

/// [`ThresholdLimits::adjust`] over the default 30-120 dB range.
pub fn adjust_threshold(current: f32, delta: f32) -> f32 {
    ThresholdLimits::default().adjust(current, delta)
}

/// Audible or visual alarm indicator.
pub trait AlarmOutput {
    type Error: Debug;

    fn set_alarm(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// Active-high buzzer on a GPIO.
///
/// The pin is only driven when the requested state differs from the last
/// one, so calling [`AlarmOutput::set_alarm`] every tick costs nothing.
pub struct Buzzer<P> {
    pin: P,
    on: Option<bool>,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: None }
    }

    /// Last state written to the pin, `None` before the first call
    pub fn is_on(&self) -> Option<bool> {
        self.on
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> AlarmOutput for Buzzer<P> {
    type Error = P::Error;

    fn set_alarm(&mut self, on: bool) -> Result<(), Self::Error> {
        if self.on == Some(on) {
            return Ok(());
        }

        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = Some(on);
        Ok(())
    }
}
