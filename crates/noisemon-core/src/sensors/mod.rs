//! Noise sensor adapter contract and its errors

use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} produced a non-finite reading")]
    InvalidReading { sensor: &'static str },
}

/// Calibrated noise level source.
///
/// Implementations hide the microphone amplifier, ADC sampling and the
/// voltage to dB conversion; the monitor only ever sees decibels.
pub trait NoiseSensor {
    /// Read the current noise level in dB.
    fn read_level(&mut self) -> Result<f32, SensorError>;
}
