//! Desktop simulator for the noisemon noise monitor.
//!
//! Runs the real control loop from `noisemon-core` against host peripherals:
//! the local clock, a synthetic noise source and a file-backed EEPROM image.
//! The OLED framebuffer is shown in an SDL2 window via
//! `embedded-graphics-simulator`, and key presses stand in for the keypad.
//!
//! # Key bindings
//!
//! | Key       | Action                                     |
//! |-----------|--------------------------------------------|
//! | + / Up    | Raise threshold / previous history record  |
//! | - / Down  | Lower threshold / next history record      |
//! | H         | Browse history                             |
//! | X         | Leave history                              |
//! | Q / Esc   | Quit                                       |
//!
//! `noisemon-simulator --dump` prints the stored history as JSON lines and
//! exits without opening a window.

mod config;
mod host;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};
use log::{error, info};

use noisemon_core::alarm::AlarmOutput;
use noisemon_core::config::STORE_CAPACITY;
use noisemon_core::device::{Device, Peripherals};
use noisemon_core::display::OledPresenter;
use noisemon_core::framebuffer::{MonoFrameBuffer, OLED_HEIGHT_PX, OLED_WIDTH_PX};
use noisemon_core::storage::{CircularLog, RECORD_SIZE};

use crate::config::SimConfig;
use crate::host::{
    Command, FileStore, HostClock, KeyButtons, LogBuzzer, SyntheticNoise, keycode_to_command,
};

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 4;

/// Event polling period while the fault screen is up.
const FAULT_POLL: Duration = Duration::from_millis(50);

/// Every slot of the image, for the dump
const MAX_SLOTS: usize = STORE_CAPACITY / RECORD_SIZE;

type SimDevice = Device<
    FileStore,
    HostClock,
    SyntheticNoise,
    KeyButtons,
    LogBuzzer,
    OledPresenter<MonoFrameBuffer>,
>;

/// Print every valid record in the image as one JSON object per line.
fn dump_history(config: &SimConfig) -> Result<()> {
    let store = FileStore::open(&config.store_path)?;
    let mut log = CircularLog::new(store).map_err(|e| anyhow!("{}", e))?;

    let records = log
        .scan_all::<MAX_SLOTS>(usize::MAX)
        .map_err(|e| anyhow!("Reading history failed: {}", e))?;

    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    info!("Dumped {} records", records.len());

    Ok(())
}

/// Copy what changed in the framebuffer to the window.
fn present(
    device: &mut SimDevice,
    panel: &mut SimulatorDisplay<BinaryColor>,
    window: &mut Window,
) {
    let fb = device.peripherals_mut().display.target_mut();
    let Ok(()) = fb.flush(panel);
    window.update(panel);
}

/// Keep the window open until the user closes it.
fn wait_for_close(window: &mut Window) {
    loop {
        if window
            .events()
            .any(|event| matches!(event, SimulatorEvent::Quit))
        {
            return;
        }
        thread::sleep(FAULT_POLL);
    }
}

fn run_monitor(config: &SimConfig) -> Result<()> {
    let store = FileStore::open(&config.store_path)?;
    let peripherals = Peripherals {
        clock: HostClock,
        sensor: SyntheticNoise::new(),
        buttons: KeyButtons::default(),
        alarm: LogBuzzer::default(),
        display: OledPresenter::new(MonoFrameBuffer::new()),
    };

    let mut device: SimDevice = Device::new(store, peripherals, config.monitor)
        .map_err(|e| anyhow!("Creating monitor failed: {}", e))?;

    let mut panel = SimulatorDisplay::<BinaryColor>::new(Size::new(
        OLED_WIDTH_PX as u32,
        OLED_HEIGHT_PX as u32,
    ));
    let output_settings = OutputSettingsBuilder::new()
        .scale(WINDOW_SCALE)
        .theme(BinaryColorTheme::OledBlue)
        .build();
    let mut window = Window::new("Noisemon Simulator", &output_settings);

    // The SDL window is created on the first `update()`, which must happen
    // before `events()` is called.
    if let Err(e) = device.start() {
        present(&mut device, &mut panel, &mut window);
        error!("Store check failed, close the window to exit");
        wait_for_close(&mut window);
        return Err(anyhow!("Startup failed: {}", e));
    }
    present(&mut device, &mut panel, &mut window);

    let interval = Duration::from_millis(u64::from(config.monitor.tick_interval_ms));

    'running: loop {
        let tick_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode_to_command(keycode) {
                    Some(Command::Quit) => break 'running,
                    Some(Command::Button(button)) => {
                        device.peripherals_mut().buttons.press(button);
                    }
                    None => {}
                },
                _ => {}
            }
        }

        if let Err(e) = device.tick() {
            error!("Tick failed: {}", e);
            return Err(anyhow!("Monitor stopped: {}", e));
        }
        present(&mut device, &mut panel, &mut window);

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }

    let Ok(()) = device.peripherals_mut().alarm.set_alarm(false);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    config.log_config();

    if std::env::args().skip(1).any(|arg| arg == "--dump") {
        return dump_history(&config);
    }

    info!("Starting noisemon simulator");
    info!(
        "Display: {}x{} (scale {}x)",
        OLED_WIDTH_PX, OLED_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: +=Raise  -=Lower  H=History  X=Exit history  Q=Quit");
    run_monitor(&config)?;
    info!("Simulator exiting");

    Ok(())
}
