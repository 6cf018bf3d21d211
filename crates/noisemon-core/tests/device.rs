//! End-to-end behaviour of the control loop against in-memory peripherals.

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use noisemon_core::alarm::AlarmOutput;
use noisemon_core::app_state::{MonitorError, Mode};
use noisemon_core::clock::{Clock, ClockError, Timestamp};
use noisemon_core::config::{MonitorConfig, RECORD_SENTINEL, STORE_CAPACITY};
use noisemon_core::device::{Device, Peripherals};
use noisemon_core::display::{Presentation, Screen, View};
use noisemon_core::input::{ButtonEvent, ButtonInput};
use noisemon_core::sensors::{NoiseSensor, SensorError};
use noisemon_core::storage::{ByteStore, RamStore, StorageError};

/// Steps through a fixed list of times, repeating the last one.
struct ScriptedClock {
    times: Vec<Timestamp>,
    reads: usize,
}

impl ScriptedClock {
    fn fixed(ts: Timestamp) -> Self {
        Self {
            times: vec![ts],
            reads: 0,
        }
    }

    fn seconds(count: u8) -> Self {
        Self {
            times: (0..count)
                .map(|s| Timestamp::new(2024, 1, 15, 10, 30 + s / 60, s % 60))
                .collect(),
            reads: 0,
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&mut self) -> Result<Timestamp, ClockError> {
        let ts = self.times[self.reads.min(self.times.len() - 1)];
        self.reads += 1;
        Ok(ts)
    }
}

struct FixedSensor {
    level: f32,
}

impl NoiseSensor for FixedSensor {
    fn read_level(&mut self) -> Result<f32, SensorError> {
        Ok(self.level)
    }
}

#[derive(Default)]
struct ScriptedButtons {
    events: VecDeque<ButtonEvent>,
    stuck: bool,
}

impl ScriptedButtons {
    fn push(&mut self, event: ButtonEvent) {
        self.events.push_back(event);
    }
}

impl ButtonInput for ScriptedButtons {
    type Error = &'static str;

    fn poll(&mut self) -> Result<ButtonEvent, Self::Error> {
        if self.stuck {
            return Err("keypad not responding");
        }
        Ok(self.events.pop_front().unwrap_or(ButtonEvent::None))
    }
}

#[derive(Default)]
struct RecordingAlarm {
    states: Vec<bool>,
}

impl AlarmOutput for RecordingAlarm {
    type Error = Infallible;

    fn set_alarm(&mut self, on: bool) -> Result<(), Self::Error> {
        self.states.push(on);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingDisplay {
    views: Vec<View>,
}

impl RecordingDisplay {
    fn last_screen(&self) -> Screen {
        Screen::from_view(self.views.last().unwrap())
    }
}

impl Presentation for RecordingDisplay {
    type Error = Infallible;

    fn render(&mut self, view: &View) -> Result<(), Self::Error> {
        self.views.push(*view);
        Ok(())
    }
}

/// Acknowledges writes but never keeps them.
struct DeadStore;

impl ByteStore for DeadStore {
    fn capacity(&self) -> usize {
        STORE_CAPACITY
    }

    fn read_byte(&mut self, _address: usize) -> Result<u8, StorageError> {
        Ok(0xFF)
    }

    fn write_byte(&mut self, _address: usize, _value: u8) -> Result<(), StorageError> {
        Ok(())
    }
}

/// RAM store whose reads of one address fail.
struct BadCellStore {
    inner: RamStore<STORE_CAPACITY>,
    bad_address: usize,
}

impl ByteStore for BadCellStore {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError> {
        if address == self.bad_address {
            return Err(StorageError::Bus {
                operation: "read",
                address,
            });
        }
        self.inner.read_byte(address)
    }

    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError> {
        self.inner.write_byte(address, value)
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

type TestDevice<S> =
    Device<S, ScriptedClock, FixedSensor, ScriptedButtons, RecordingAlarm, RecordingDisplay>;

fn device_with<S: ByteStore>(store: S, clock: ScriptedClock, level: f32) -> TestDevice<S> {
    let peripherals = Peripherals {
        clock,
        sensor: FixedSensor { level },
        buttons: ScriptedButtons::default(),
        alarm: RecordingAlarm::default(),
        display: RecordingDisplay::default(),
    };
    let mut device = Device::new(store, peripherals, MonitorConfig::default()).unwrap();
    device.start().unwrap();
    device
}

fn device(clock: ScriptedClock, level: f32) -> TestDevice<RamStore<STORE_CAPACITY>> {
    device_with(RamStore::new(), clock, level)
}

fn morning() -> Timestamp {
    Timestamp::new(2024, 1, 15, 10, 30, 45)
}

#[test]
fn test_live_tick_stores_and_shows_reading() {
    let mut device = device(ScriptedClock::fixed(morning()), 92.5);

    assert_eq!(device.tick().unwrap(), Mode::Live);

    let image = device.monitor().log().store().image();
    assert_eq!(image[0], RECORD_SENTINEL);
    assert_eq!(device.monitor().log().cursor(), 12);

    let screen = device.peripherals().display.last_screen();
    assert_eq!(screen.line(0), "Date:2024-01-15");
    assert_eq!(screen.line(1), "Time:10:30:45");
    assert_eq!(screen.line(2), "Noise:092dB");
    assert_eq!(screen.line(3), "Thrsh:080 Warn!");
}

#[test]
fn test_single_record_browse() {
    let mut device = device(ScriptedClock::fixed(morning()), 92.5);
    device.tick().unwrap();

    device
        .peripherals_mut()
        .buttons
        .push(ButtonEvent::EnterHistory);
    assert_eq!(device.tick().unwrap(), Mode::HistoryBrowse);

    let screen = device.peripherals().display.last_screen();
    assert_eq!(screen.line(0), "History 01/01");
    assert_eq!(screen.line(1), "2024-01-15");
    assert_eq!(screen.line(2), "10:30:45");
    assert_eq!(screen.line(3), "Noise:092dB");
}

#[test]
fn test_same_second_stored_once() {
    let clock = ScriptedClock {
        times: vec![
            morning(),
            morning(),
            Timestamp::new(2024, 1, 15, 10, 30, 46),
        ],
        reads: 0,
    };
    let mut device = device(clock, 50.0);

    device.tick().unwrap();
    device.tick().unwrap();
    assert_eq!(device.monitor().log().cursor(), 12);

    device.tick().unwrap();
    assert_eq!(device.monitor().log().cursor(), 24);
}

#[test]
fn test_alarm_follows_threshold() {
    let mut device = device(ScriptedClock::seconds(3), 92.5);

    device.tick().unwrap();
    device.peripherals_mut().sensor.level = 80.0;
    device.tick().unwrap();
    device.peripherals_mut().sensor.level = 80.1;
    device.tick().unwrap();

    assert_eq!(device.peripherals().alarm.states, vec![true, false, true]);
}

#[test]
fn test_threshold_buttons_clamp() {
    let mut device = device(ScriptedClock::fixed(morning()), 50.0);
    for _ in 0..10 {
        device.peripherals_mut().buttons.push(ButtonEvent::Increase);
    }

    for _ in 0..10 {
        device.tick().unwrap();
    }
    assert_eq!(device.monitor().threshold_db(), 120.0);

    device.tick().unwrap();
    let screen = device.peripherals().display.last_screen();
    assert_eq!(screen.line(3), "Thrsh:120 Safe");
}

#[test]
fn test_wraparound_caps_history() {
    let mut device = device(ScriptedClock::seconds(30), 60.0);
    for _ in 0..30 {
        device.tick().unwrap();
    }

    // 21 slots: appends 22 to 30 overwrite slots 0 to 8.
    assert_eq!(device.monitor().log().cursor(), 9 * 12);

    device
        .peripherals_mut()
        .buttons
        .push(ButtonEvent::EnterHistory);
    device.tick().unwrap();

    assert_eq!(device.monitor().state().history().len(), 20);
    let screen = device.peripherals().display.last_screen();
    assert_eq!(screen.line(0), "History 01/20");
    // Slot 0 now holds the 22nd reading.
    assert_eq!(screen.line(2), "10:30:21");
}

#[test]
fn test_browsing_pauses_sampling() {
    let mut device = device(ScriptedClock::seconds(10), 95.0);
    device.tick().unwrap();

    device
        .peripherals_mut()
        .buttons
        .push(ButtonEvent::EnterHistory);
    device.tick().unwrap();
    let reads = device.peripherals().clock.reads;
    let cursor = device.monitor().log().cursor();
    let alarm_writes = device.peripherals().alarm.states.len();

    for _ in 0..5 {
        assert_eq!(device.tick().unwrap(), Mode::HistoryBrowse);
    }

    assert_eq!(device.peripherals().clock.reads, reads);
    assert_eq!(device.monitor().log().cursor(), cursor);
    assert_eq!(device.peripherals().alarm.states.len(), alarm_writes);
}

#[test]
fn test_exit_resumes_live_on_next_tick() {
    let mut device = device(ScriptedClock::seconds(10), 40.0);
    device.tick().unwrap();

    let buttons = &mut device.peripherals_mut().buttons;
    buttons.push(ButtonEvent::EnterHistory);
    buttons.push(ButtonEvent::Exit);
    device.tick().unwrap();
    assert_eq!(device.tick().unwrap(), Mode::Live);

    // Nothing fresh to show on the exit tick itself.
    let rendered = device.peripherals().display.views.len();
    assert!(matches!(
        device.peripherals().display.views.last(),
        Some(View::History(_))
    ));

    device.tick().unwrap();
    assert_eq!(device.peripherals().display.views.len(), rendered + 1);
    assert!(matches!(
        device.peripherals().display.views.last(),
        Some(View::Live(_))
    ));
    assert!(device.monitor().state().history().is_empty());
}

#[test]
fn test_dead_store_halts_with_fault_screen() {
    let peripherals = Peripherals {
        clock: ScriptedClock::fixed(morning()),
        sensor: FixedSensor { level: 50.0 },
        buttons: ScriptedButtons::default(),
        alarm: RecordingAlarm::default(),
        display: RecordingDisplay::default(),
    };
    let mut device = Device::new(DeadStore, peripherals, MonitorConfig::default()).unwrap();

    let err = device.start().unwrap_err();
    assert_eq!(
        err,
        MonitorError::Storage(StorageError::ProbeFailed {
            expected: RECORD_SENTINEL,
            found: 0xFF,
        })
    );

    let peripherals = device.peripherals();
    assert_eq!(peripherals.alarm.states, vec![false]);
    assert_eq!(peripherals.display.views, vec![View::StoreFault { found: Some(0xFF) }]);
    let screen = peripherals.display.last_screen();
    assert_eq!(screen.line(0), "24C02 Error!");
    assert_eq!(screen.line(1), "Read:FF");
}

#[test]
fn test_history_read_failure_stays_live() {
    let store = BadCellStore {
        inner: RamStore::new(),
        bad_address: 30,
    };
    let mut device = device_with(store, ScriptedClock::seconds(5), 50.0);
    device.tick().unwrap();

    device
        .peripherals_mut()
        .buttons
        .push(ButtonEvent::EnterHistory);
    let err = device.tick().unwrap_err();

    assert_eq!(
        err,
        MonitorError::Storage(StorageError::Bus {
            operation: "read",
            address: 30,
        })
    );
    assert_eq!(device.monitor().mode(), Mode::Live);
    assert!(device.monitor().state().history().is_empty());
}

#[test]
fn test_non_finite_reading_is_rejected() {
    let mut device = device(ScriptedClock::fixed(morning()), f32::NAN);

    let err = device.tick().unwrap_err();
    assert_eq!(
        err,
        MonitorError::Sensor(SensorError::InvalidReading { sensor: "noise" })
    );
    assert_eq!(device.monitor().log().cursor(), 0);
}

#[test]
fn test_run_stops_on_input_failure() {
    let mut device = device(ScriptedClock::seconds(5), 50.0);
    device.peripherals_mut().buttons.stuck = true;

    let err = device.run(&mut NoDelay).unwrap_err();
    assert_eq!(err, MonitorError::Input);
    // The sample was taken before the keypad failed.
    assert_eq!(device.monitor().log().cursor(), 12);
}
