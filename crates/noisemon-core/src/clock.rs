//! Wall-clock timestamps and the real-time clock adapter contract

use core::fmt::Display;

use serde::Serialize;
use thiserror_no_std::Error;

/// Calendar timestamp as read from the RTC.
///
/// No timezone or leap-second handling; the value is whatever the clock chip
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    #[error("{clock} failed to {operation}")]
    ReadFailed {
        clock: &'static str,
        operation: &'static str,
    },
    #[error("{clock} has not been set")]
    NotSet { clock: &'static str },
}

/// Source of the current calendar time.
pub trait Clock {
    fn now(&mut self) -> Result<Timestamp, ClockError>;
}
