//! Runtime configuration for the simulator.
//!
//! Values come from the environment, with an optional `.env` file loaded by
//! the caller. Anything unset falls back to the firmware defaults.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use log::info;
use noisemon_core::config::MonitorConfig;

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Default location of the persisted EEPROM image
const DEFAULT_STORE_PATH: &str = "noisemon-eeprom.bin";

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Tunables handed to the monitor
    pub monitor: MonitorConfig,

    /// File holding the 256-byte EEPROM image
    pub store_path: PathBuf,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `NOISEMON_THRESHOLD`: starting alarm threshold in dB (default 80)
/// - `NOISEMON_THRESHOLD_STEP`: dB per button press (default 5)
/// - `NOISEMON_TICK_MS`: control loop period (default 50)
/// - `NOISEMON_STORE_PATH`: EEPROM image file (default `noisemon-eeprom.bin`)
///
/// Returns an error if a variable does not parse or the resulting monitor
/// configuration is inconsistent.
pub fn load_from_env() -> Result<SimConfig> {
    let defaults = MonitorConfig::default();

    let monitor = MonitorConfig {
        initial_threshold_db: parse_env_f32!("NOISEMON_THRESHOLD", defaults.initial_threshold_db),
        threshold_step_db: parse_env_f32!("NOISEMON_THRESHOLD_STEP", defaults.threshold_step_db),
        tick_interval_ms: parse_env_u32!("NOISEMON_TICK_MS", defaults.tick_interval_ms),
        ..defaults
    };
    monitor
        .validate()
        .map_err(|e| anyhow!("Invalid monitor configuration: {}", e))?;

    let store_path = env::var("NOISEMON_STORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));

    Ok(SimConfig {
        monitor,
        store_path,
    })
}

impl SimConfig {
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!(
            "  NOISEMON_THRESHOLD      : {:.1} dB",
            self.monitor.initial_threshold_db
        );
        info!(
            "  NOISEMON_THRESHOLD_STEP : {:.1} dB",
            self.monitor.threshold_step_db
        );
        info!(
            "  NOISEMON_TICK_MS        : {}",
            self.monitor.tick_interval_ms
        );
        info!(
            "  NOISEMON_STORE_PATH     : {}",
            self.store_path.display()
        );
    }
}
