//! Compile-time constants and the tunable monitor configuration.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::alarm::ThresholdLimits;

/// Size of the AT24C02 EEPROM in bytes
pub const STORE_CAPACITY: usize = 256;

/// Maximum number of records reconstructed when browsing history
pub const HISTORY_CAPACITY: usize = 20;

/// Marker byte that opens every written record
///
/// Chosen to differ from erased EEPROM content (0xFF / 0x00) and from the
/// low byte of any plausible year.
pub const RECORD_SENTINEL: u8 = 0xA5;

/// Alarm threshold after power-up (dB)
pub const DEFAULT_THRESHOLD_DB: f32 = 80.0;

/// Threshold change per Increase/Decrease press (dB)
pub const THRESHOLD_STEP_DB: f32 = 5.0;

/// Lowest selectable alarm threshold (dB)
pub const MIN_THRESHOLD_DB: f32 = 30.0;

/// Highest selectable alarm threshold (dB)
pub const MAX_THRESHOLD_DB: f32 = 120.0;

/// Lower bound on the pause between two control-loop ticks
pub const TICK_INTERVAL_MS: u32 = 50;

/// 7-bit I2C address of the AT24C02 with A0-A2 tied low
pub const EEPROM_I2C_ADDRESS: u8 = 0x50;

/// AT24C02 internal write cycle time (t_WR)
pub const EEPROM_WRITE_CYCLE_MS: u32 = 5;

/// Consecutive low polls required before a key press is reported
pub const DEBOUNCE_TICKS: u8 = 2;

/// Tunable monitor settings.
///
/// Everything that is not part of the persisted record layout can be changed
/// here. The record layout itself is fixed (see [`crate::storage::record`]).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Threshold used until the operator changes it
    pub initial_threshold_db: f32,
    /// Increment applied per button press
    pub threshold_step_db: f32,
    /// Lower clamp for the threshold
    pub min_threshold_db: f32,
    /// Upper clamp for the threshold
    pub max_threshold_db: f32,
    /// Delay appended to every control-loop tick
    pub tick_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            initial_threshold_db: DEFAULT_THRESHOLD_DB,
            threshold_step_db: THRESHOLD_STEP_DB,
            min_threshold_db: MIN_THRESHOLD_DB,
            max_threshold_db: MAX_THRESHOLD_DB,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    /// Threshold clamp range described by this configuration
    pub const fn limits(&self) -> ThresholdLimits {
        ThresholdLimits::new(self.min_threshold_db, self.max_threshold_db)
    }

    /// Reject settings the monitor cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.initial_threshold_db,
            self.threshold_step_db,
            self.min_threshold_db,
            self.max_threshold_db,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite);
        }

        if self.min_threshold_db > self.max_threshold_db {
            return Err(ConfigError::InvertedLimits {
                min: self.min_threshold_db,
                max: self.max_threshold_db,
            });
        }

        if self.threshold_step_db <= 0.0 {
            return Err(ConfigError::NonPositiveStep(self.threshold_step_db));
        }

        if !(self.min_threshold_db..=self.max_threshold_db).contains(&self.initial_threshold_db) {
            return Err(ConfigError::InitialOutOfRange {
                initial: self.initial_threshold_db,
                min: self.min_threshold_db,
                max: self.max_threshold_db,
            });
        }

        Ok(())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("threshold settings must be finite numbers")]
    NonFinite,
    #[error("threshold minimum {min} is above maximum {max}")]
    InvertedLimits { min: f32, max: f32 },
    #[error("threshold step must be positive, got {0}")]
    NonPositiveStep(f32),
    #[error("initial threshold {initial} outside {min}..={max}")]
    InitialOutOfRange { initial: f32, min: f32, max: f32 },
}
