//! The control loop tying the monitor to its peripherals.
//!
//! Each tick runs strictly in sequence: clock read, sensor read, alarm
//! evaluation and conditional append (live mode only), button scan, state
//! machine step, render. The only pause is the fixed delay after the tick.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::alarm::AlarmOutput;
use crate::app_state::{MonitorError, Mode};
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::display::{Presentation, View};
use crate::input::ButtonInput;
use crate::monitor::Monitor;
use crate::sensors::{NoiseSensor, SensorError};
use crate::storage::{ByteStore, CircularLog, StorageError};

/// External collaborators of the monitor.
pub struct Peripherals<C, N, B, A, P> {
    pub clock: C,
    pub sensor: N,
    pub buttons: B,
    pub alarm: A,
    pub display: P,
}

/// A complete noise monitor: log, state machine and I/O.
pub struct Device<S, C, N, B, A, P>
where
    S: ByteStore,
{
    monitor: Monitor<S>,
    peripherals: Peripherals<C, N, B, A, P>,
}

impl<S, C, N, B, A, P> Device<S, C, N, B, A, P>
where
    S: ByteStore,
    C: Clock,
    N: NoiseSensor,
    B: ButtonInput,
    A: AlarmOutput,
    P: Presentation,
{
    pub fn new(
        store: S,
        peripherals: Peripherals<C, N, B, A, P>,
        config: MonitorConfig,
    ) -> Result<Self, MonitorError> {
        let log = CircularLog::new(store)?;
        let monitor = Monitor::new(log, config)?;

        Ok(Self {
            monitor,
            peripherals,
        })
    }

    /// Verify the store before the first tick.
    ///
    /// A store that does not hold a written byte is fatal: the fault view is
    /// rendered and the error returned. The caller must not tick afterwards.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        match self.monitor.log_mut().probe() {
            Ok(()) => {
                info!(
                    "Monitor started, threshold {:.1} dB",
                    self.monitor.threshold_db()
                );
                Ok(())
            }
            Err(e) => {
                let found = match e {
                    StorageError::ProbeFailed { found, .. } => Some(found),
                    _ => None,
                };
                self.halt_with_fault(found)?;
                Err(e.into())
            }
        }
    }

    /// Put the store fault screen up and silence the alarm.
    pub fn halt_with_fault(&mut self, found: Option<u8>) -> Result<(), MonitorError> {
        error!("Halting on store fault");
        self.set_alarm(false)?;
        self.render(&View::StoreFault { found })
    }

    /// Run one pass of the control loop. Returns the mode after the tick.
    pub fn tick(&mut self) -> Result<Mode, MonitorError> {
        let live = if self.monitor.mode() == Mode::Live {
            let timestamp = self.peripherals.clock.now()?;
            let noise_db = self.peripherals.sensor.read_level()?;
            if !noise_db.is_finite() {
                return Err(SensorError::InvalidReading { sensor: "noise" }.into());
            }

            let verdict = self.monitor.record_sample(timestamp, noise_db)?;
            self.set_alarm(verdict.is_alarm())?;
            Some((timestamp, noise_db, verdict))
        } else {
            None
        };

        let event = self.peripherals.buttons.poll().map_err(|e| {
            error!("Button scan failed: {:?}", e);
            MonitorError::Input
        })?;
        let mode = self.monitor.handle_event(event)?;

        let view = match (mode, live) {
            (Mode::Live, Some((timestamp, noise_db, verdict))) => {
                View::Live(self.monitor.live_view(timestamp, noise_db, verdict))
            }
            // Just left browse mode; the next tick samples and draws live data.
            (Mode::Live, None) => return Ok(mode),
            (Mode::HistoryBrowse, _) => View::History(self.monitor.history_view()),
        };
        self.render(&view)?;

        Ok(mode)
    }

    /// Tick forever, pausing the configured interval between ticks.
    ///
    /// Only returns on an error.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> Result<Infallible, MonitorError> {
        let interval_ms = self.monitor.config().tick_interval_ms;
        loop {
            self.tick()?;
            delay.delay_ms(interval_ms);
        }
    }

    pub fn monitor(&self) -> &Monitor<S> {
        &self.monitor
    }

    pub fn peripherals(&self) -> &Peripherals<C, N, B, A, P> {
        &self.peripherals
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<C, N, B, A, P> {
        &mut self.peripherals
    }

    pub fn into_parts(self) -> (Monitor<S>, Peripherals<C, N, B, A, P>) {
        (self.monitor, self.peripherals)
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), MonitorError> {
        self.peripherals.alarm.set_alarm(on).map_err(|e| {
            error!("Alarm output failed: {:?}", e);
            MonitorError::AlarmOutput
        })
    }

    fn render(&mut self, view: &View) -> Result<(), MonitorError> {
        self.peripherals.display.render(view).map_err(|e| {
            error!("Render failed: {:?}", e);
            MonitorError::Display
        })
    }
}
