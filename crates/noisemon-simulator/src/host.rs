//! Host stand-ins for the monitor's peripherals.

use std::convert::Infallible;
use std::fs::{File, OpenOptions};
use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use embedded_graphics_simulator::sdl2::Keycode;
use log::{debug, error, info, warn};

use noisemon_core::alarm::AlarmOutput;
use noisemon_core::clock::{Clock, ClockError, Timestamp};
use noisemon_core::config::STORE_CAPACITY;
use noisemon_core::input::{ButtonEvent, ButtonInput};
use noisemon_core::sensors::{NoiseSensor, SensorError};
use noisemon_core::storage::{ByteStore, StorageError};
use noisemon_core::storage::ram::ERASED_BYTE;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Local wall-clock time.
pub struct HostClock;

impl Clock for HostClock {
    fn now(&mut self) -> Result<Timestamp, ClockError> {
        let now = Local::now();
        let year = u16::try_from(now.year()).map_err(|_| ClockError::ReadFailed {
            clock: "host clock",
            operation: "convert year",
        })?;

        // chrono guarantees the remaining fields fit in a byte
        Ok(Timestamp::new(
            year,
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        ))
    }
}

// ---------------------------------------------------------------------------
// Noise
// ---------------------------------------------------------------------------

/// Synthetic noise level that drifts back and forth across the default
/// threshold, with a faster ripple on top.
pub struct SyntheticNoise {
    started: Instant,
}

impl SyntheticNoise {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl NoiseSensor for SyntheticNoise {
    fn read_level(&mut self) -> Result<f32, SensorError> {
        let t = self.started.elapsed().as_secs_f64();

        // Roughly 49-91 dB
        let level = 70.0 + 15.0 * (t / 7.0).sin() + 6.0 * (t / 2.3).cos();
        Ok(level as f32)
    }
}

// ---------------------------------------------------------------------------
// EEPROM image
// ---------------------------------------------------------------------------

/// EEPROM emulated by a 256-byte file so the log survives restarts.
///
/// Every access is a single-byte seek and read or write, like the bus
/// transactions of the real part.
pub struct FileStore {
    file: File,
}

impl FileStore {
    /// Open the image, creating or padding it with erased bytes as needed.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("opening EEPROM image {}", path.display()))?;

        let len = file.metadata()?.len() as usize;
        if len < STORE_CAPACITY {
            info!(
                "Initialising EEPROM image {} ({} bytes erased)",
                path.display(),
                STORE_CAPACITY - len
            );
            file.seek(SeekFrom::Start(len as u64))?;
            file.write_all(&[ERASED_BYTE; STORE_CAPACITY][len..])?;
            file.flush()?;
        } else if len > STORE_CAPACITY {
            warn!(
                "EEPROM image {} is {} bytes, only the first {} are used",
                path.display(),
                len,
                STORE_CAPACITY
            );
        }

        Ok(Self { file })
    }

    fn check(&self, address: usize) -> Result<(), StorageError> {
        if address >= STORE_CAPACITY {
            return Err(StorageError::AddressOutOfRange {
                address,
                capacity: STORE_CAPACITY,
            });
        }
        Ok(())
    }

    fn bus_error(operation: &'static str, address: usize, e: io::Error) -> StorageError {
        error!("EEPROM image {} at {:#04x} failed: {}", operation, address, e);
        StorageError::Bus { operation, address }
    }
}

impl ByteStore for FileStore {
    fn capacity(&self) -> usize {
        STORE_CAPACITY
    }

    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError> {
        self.check(address)?;

        let mut byte = [0u8; 1];
        self.file
            .seek(SeekFrom::Start(address as u64))
            .and_then(|_| self.file.read_exact(&mut byte))
            .map_err(|e| Self::bus_error("read", address, e))?;
        Ok(byte[0])
    }

    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError> {
        self.check(address)?;

        self.file
            .seek(SeekFrom::Start(address as u64))
            .and_then(|_| self.file.write_all(&[value]))
            .map_err(|e| Self::bus_error("write", address, e))
    }
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// What a key press on the simulator window asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Button(ButtonEvent),
    Quit,
}

/// Map an SDL keycode to a command.
pub fn keycode_to_command(keycode: Keycode) -> Option<Command> {
    match keycode {
        Keycode::Plus | Keycode::KpPlus | Keycode::Equals | Keycode::Up => {
            Some(Command::Button(ButtonEvent::Increase))
        }
        Keycode::Minus | Keycode::KpMinus | Keycode::Down => {
            Some(Command::Button(ButtonEvent::Decrease))
        }
        Keycode::H => Some(Command::Button(ButtonEvent::EnterHistory)),
        Keycode::X | Keycode::Backspace => Some(Command::Button(ButtonEvent::Exit)),
        Keycode::Q | Keycode::Escape => Some(Command::Quit),
        _ => None,
    }
}

/// Buttons fed from window key presses.
///
/// Presses queue up between ticks and each poll takes at most one, so two
/// quick presses of `+` land on consecutive ticks like on the keypad.
#[derive(Default)]
pub struct KeyButtons {
    pending: VecDeque<ButtonEvent>,
}

impl KeyButtons {
    pub fn press(&mut self, event: ButtonEvent) {
        self.pending.push_back(event);
    }
}

impl ButtonInput for KeyButtons {
    type Error = Infallible;

    fn poll(&mut self) -> Result<ButtonEvent, Self::Error> {
        let event = self.pending.pop_front().unwrap_or(ButtonEvent::None);
        if event != ButtonEvent::None {
            debug!("Key: {:?}", event);
        }
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Buzzer that reports state changes in the log.
#[derive(Default)]
pub struct LogBuzzer {
    on: bool,
}

impl AlarmOutput for LogBuzzer {
    type Error = Infallible;

    fn set_alarm(&mut self, on: bool) -> Result<(), Self::Error> {
        if on != self.on {
            if on {
                warn!("BUZZER ON: noise above threshold");
            } else {
                info!("Buzzer off");
            }
            self.on = on;
        }
        Ok(())
    }
}
