//! Device-wide state and error types for noisemon

use heapless::Vec;
use thiserror_no_std::Error;

use crate::clock::ClockError;
use crate::config::{ConfigError, HISTORY_CAPACITY};
use crate::sensors::SensorError;
use crate::storage::{ReadingRecord, StorageError};

/// Records reconstructed for browsing
pub type History = Vec<ReadingRecord, HISTORY_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Sampling, storing and showing the current level
    Live,
    /// Navigating records read back from the store
    HistoryBrowse,
}

/// Mutable state of the monitor.
///
/// There is exactly one of these, owned by the [`Monitor`](crate::monitor::Monitor).
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub(crate) threshold_db: f32,
    pub(crate) mode: Mode,
    /// Only meaningful in [`Mode::HistoryBrowse`]
    pub(crate) selected_index: usize,
    /// Second-of-minute of the last stored record, `None` until the first one
    pub(crate) last_stored_second: Option<u8>,
    /// Filled on entry to browse mode, emptied on exit
    pub(crate) history: History,
}

impl DeviceState {
    pub fn new(threshold_db: f32) -> Self {
        Self {
            threshold_db,
            mode: Mode::Live,
            selected_index: 0,
            last_stored_second: None,
            history: Vec::new(),
        }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn last_stored_second(&self) -> Option<u8> {
        self.last_stored_second
    }

    pub fn history(&self) -> &[ReadingRecord] {
        &self.history
    }

    /// Record under the cursor while browsing
    pub fn selected_record(&self) -> Option<&ReadingRecord> {
        self.history.get(self.selected_index)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MonitorError {
    #[error("Storage error: {0}")]
    Storage(StorageError),
    #[error("Sensor error: {0}")]
    Sensor(SensorError),
    #[error("Clock error: {0}")]
    Clock(ClockError),
    #[error("Invalid configuration: {0}")]
    Config(ConfigError),
    #[error("Button input failed")]
    Input,
    #[error("Alarm output failed")]
    AlarmOutput,
    #[error("Display failed")]
    Display,
}

impl From<StorageError> for MonitorError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<SensorError> for MonitorError {
    fn from(value: SensorError) -> Self {
        Self::Sensor(value)
    }
}

impl From<ClockError> for MonitorError {
    fn from(value: ClockError) -> Self {
        Self::Clock(value)
    }
}

impl From<ConfigError> for MonitorError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
