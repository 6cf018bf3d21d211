//! Hardware-independent core library for noisemon
//!
//! This crate contains all platform-agnostic logic for the noisemon noise
//! monitor: the persistent circular log over a byte-addressable EEPROM, the
//! live/history mode state machine, alarm evaluation, and the adapters that
//! can be expressed purely over `embedded-hal` and `embedded-graphics` traits.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod alarm;
pub mod app_state;
pub mod clock;
pub mod config;
pub mod device;
pub mod display;
pub mod framebuffer;
pub mod input;
pub mod monitor;
pub mod sensors;
pub mod storage;
