//! What the device shows, independent of how it is drawn.
//!
//! The monitor produces a [`View`] each tick. [`Screen`] lays a view out on
//! the 4 x 16 character panel, and a [`Presentation`] sink puts it on glass.

mod oled;

pub use oled::OledPresenter;

use core::fmt::{Debug, Write};

use heapless::String;

use crate::alarm::AlarmVerdict;
use crate::clock::Timestamp;
use crate::storage::ReadingRecord;

/// Text rows on the panel
pub const SCREEN_LINES: usize = 4;

/// Characters per row
pub const SCREEN_COLUMNS: usize = 16;

pub type ScreenLine = String<SCREEN_COLUMNS>;

/// Live-mode fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveView {
    pub timestamp: Timestamp,
    pub noise_db: f32,
    pub threshold_db: f32,
    pub verdict: AlarmVerdict,
}

/// History-browse fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryView {
    /// Selected record, `None` when the log holds no valid records
    pub record: Option<ReadingRecord>,
    /// 1-based position of the selection, 0 when there is nothing to show
    pub position: usize,
    /// Number of records reconstructed
    pub total: usize,
}

/// Everything the display can be asked to show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Live(LiveView),
    History(HistoryView),
    /// Startup store check failed. Carries the byte read back, if any.
    StoreFault { found: Option<u8> },
}

/// Sink for rendered views.
pub trait Presentation {
    type Error: Debug;

    fn render(&mut self, view: &View) -> Result<(), Self::Error>;
}

/// A view laid out as fixed text rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    lines: [ScreenLine; SCREEN_LINES],
}

impl Screen {
    pub fn from_view(view: &View) -> Self {
        let mut screen = Self {
            lines: core::array::from_fn(|_| ScreenLine::new()),
        };

        match view {
            View::Live(live) => screen.layout_live(live),
            View::History(history) => screen.layout_history(history),
            View::StoreFault { found } => screen.layout_fault(*found),
        }

        screen
    }

    pub fn lines(&self) -> &[ScreenLine; SCREEN_LINES] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map(|l| l.as_str()).unwrap_or("")
    }

    // Rows longer than the panel are cut at the write that overflows.
    fn set(&mut self, row: usize, args: core::fmt::Arguments<'_>) {
        let line = &mut self.lines[row];
        line.clear();
        let _ = line.write_fmt(args);
    }

    fn layout_live(&mut self, live: &LiveView) {
        let ts = &live.timestamp;
        self.set(
            0,
            format_args!("Date:{:04}-{:02}-{:02}", ts.year, ts.month, ts.day),
        );
        self.set(
            1,
            format_args!("Time:{:02}:{:02}:{:02}", ts.hour, ts.minute, ts.second),
        );
        self.set(2, format_args!("Noise:{:03}dB", whole_db(live.noise_db)));
        self.set(
            3,
            format_args!(
                "Thrsh:{:03} {}",
                whole_db(live.threshold_db),
                live.verdict.label()
            ),
        );
    }

    fn layout_history(&mut self, history: &HistoryView) {
        self.set(
            0,
            format_args!("History {:02}/{:02}", history.position, history.total),
        );

        let Some(record) = history.record else {
            self.set(1, format_args!("No Data!"));
            return;
        };

        let ts = &record.timestamp;
        self.set(
            1,
            format_args!("{:04}-{:02}-{:02}", ts.year, ts.month, ts.day),
        );
        self.set(
            2,
            format_args!("{:02}:{:02}:{:02}", ts.hour, ts.minute, ts.second),
        );
        self.set(3, format_args!("Noise:{:03}dB", whole_db(record.noise_db)));
    }

    fn layout_fault(&mut self, found: Option<u8>) {
        self.set(0, format_args!("24C02 Error!"));
        match found {
            Some(byte) => self.set(1, format_args!("Read:{:02X}", byte)),
            None => self.set(1, format_args!("Bus fault")),
        }
    }
}

/// Whole decibels for the 3-digit fields. Negative and NaN show as 0.
fn whole_db(value: f32) -> u16 {
    value as u16
}
