//! Live/history mode state machine.
//!
//! | Mode          | Event        | Effect                                  |
//! |---------------|--------------|-----------------------------------------|
//! | Live          | Increase     | threshold += step (clamped)             |
//! | Live          | Decrease     | threshold -= step (clamped)             |
//! | Live          | EnterHistory | scan the log, select first, browse      |
//! | HistoryBrowse | Increase     | select previous (stops at first)        |
//! | HistoryBrowse | Decrease     | select next (stops at last)             |
//! | HistoryBrowse | Exit         | drop the history, back to live          |
//!
//! Every other combination is ignored. The same two buttons mean "threshold"
//! in live mode and "selection" while browsing, and Increase moves toward the
//! lower index.

use log::{debug, info};

use crate::alarm::{self, AlarmVerdict};
use crate::app_state::{DeviceState, History, MonitorError, Mode};
use crate::clock::Timestamp;
use crate::config::{HISTORY_CAPACITY, MonitorConfig};
use crate::display::{HistoryView, LiveView};
use crate::input::ButtonEvent;
use crate::storage::{ByteStore, CircularLog, ReadingRecord, StorageError};

/// Circular log plus the device state that drives it.
pub struct Monitor<S: ByteStore> {
    log: CircularLog<S>,
    state: DeviceState,
    config: MonitorConfig,
}

impl<S: ByteStore> Monitor<S> {
    /// Build a monitor in live mode with the configured initial threshold.
    pub fn new(log: CircularLog<S>, config: MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;

        Ok(Self {
            log,
            state: DeviceState::new(config.initial_threshold_db),
            config,
        })
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn threshold_db(&self) -> f32 {
        self.state.threshold_db
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn log(&self) -> &CircularLog<S> {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut CircularLog<S> {
        &mut self.log
    }

    /// Live-mode sampling step.
    ///
    /// Evaluates the alarm and appends a record whenever the seconds field
    /// differs from the last stored one. Storage is edge triggered on that
    /// change, so polling several times within one second stores once.
    pub fn record_sample(
        &mut self,
        timestamp: Timestamp,
        noise_db: f32,
    ) -> Result<AlarmVerdict, StorageError> {
        let verdict = alarm::evaluate(noise_db, self.state.threshold_db);

        if self.state.last_stored_second != Some(timestamp.second) {
            self.log.append(&ReadingRecord::new(timestamp, noise_db))?;
            self.state.last_stored_second = Some(timestamp.second);
        }

        Ok(verdict)
    }

    /// Apply one button event. Returns the mode after the transition.
    pub fn handle_event(&mut self, event: ButtonEvent) -> Result<Mode, StorageError> {
        let step = self.config.threshold_step_db;

        match (self.state.mode, event) {
            (Mode::Live, ButtonEvent::Increase) => self.adjust_threshold(step),
            (Mode::Live, ButtonEvent::Decrease) => self.adjust_threshold(-step),
            (Mode::Live, ButtonEvent::EnterHistory) => self.enter_history()?,
            (Mode::HistoryBrowse, ButtonEvent::Increase) => {
                self.state.selected_index = self.state.selected_index.saturating_sub(1);
            }
            (Mode::HistoryBrowse, ButtonEvent::Decrease) => {
                let last = self.state.history.len().saturating_sub(1);
                self.state.selected_index = (self.state.selected_index + 1).min(last);
            }
            (Mode::HistoryBrowse, ButtonEvent::Exit) => self.exit_history(),
            (Mode::Live, ButtonEvent::Exit)
            | (Mode::HistoryBrowse, ButtonEvent::EnterHistory)
            | (_, ButtonEvent::None) => {}
        }

        Ok(self.state.mode)
    }

    fn adjust_threshold(&mut self, delta: f32) {
        let limits = self.config.limits();
        self.state.threshold_db = limits.adjust(self.state.threshold_db, delta);
        debug!("Threshold now {:.1} dB", self.state.threshold_db);
    }

    fn enter_history(&mut self) -> Result<(), StorageError> {
        let history: History = self.log.scan_all(HISTORY_CAPACITY)?;

        info!("Browsing history: {} records", history.len());
        self.state.history = history;
        self.state.selected_index = 0;
        self.state.mode = Mode::HistoryBrowse;
        Ok(())
    }

    fn exit_history(&mut self) {
        self.state.history.clear();
        self.state.selected_index = 0;
        self.state.mode = Mode::Live;
        info!("Back to live mode");
    }

    /// Live-mode fields for a fresh sample.
    pub fn live_view(
        &self,
        timestamp: Timestamp,
        noise_db: f32,
        verdict: AlarmVerdict,
    ) -> LiveView {
        LiveView {
            timestamp,
            noise_db,
            threshold_db: self.state.threshold_db,
            verdict,
        }
    }

    /// Browse-mode fields for the current selection.
    pub fn history_view(&self) -> HistoryView {
        let record = self.state.selected_record().copied();
        HistoryView {
            record,
            position: if record.is_some() {
                self.state.selected_index + 1
            } else {
                0
            },
            total: self.state.history.len(),
        }
    }
}
