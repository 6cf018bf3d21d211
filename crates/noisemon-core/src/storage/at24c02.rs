//! AT24C02 2-Kbit I2C EEPROM driver.
//!
//! Only the two single-byte operations the log needs are implemented:
//! - random read: write the word address, repeated start, read one byte
//! - byte write: write the word address and the data byte, then wait out the
//!   internal write cycle (the chip NACKs everything until it is done)

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::error;

use super::{ByteStore, StorageError};
use crate::config::{EEPROM_I2C_ADDRESS, EEPROM_WRITE_CYCLE_MS, STORE_CAPACITY};

pub struct At24c02<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> At24c02<I, D> {
    /// Driver for a chip with A0-A2 tied low.
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address_pins(i2c, delay, 0)
    }

    /// Driver for a chip whose A2..A0 pins are strapped to `pins` (0-7).
    pub fn with_address_pins(i2c: I, delay: D, pins: u8) -> Self {
        Self {
            i2c,
            delay,
            address: EEPROM_I2C_ADDRESS | (pins & 0b111),
        }
    }

    /// 7-bit bus address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the bus and delay provider.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn word_address(address: usize) -> Result<u8, StorageError> {
        u8::try_from(address).map_err(|_| StorageError::AddressOutOfRange {
            address,
            capacity: STORE_CAPACITY,
        })
    }
}

impl<I: I2c, D: DelayNs> ByteStore for At24c02<I, D> {
    fn capacity(&self) -> usize {
        STORE_CAPACITY
    }

    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError> {
        let word = Self::word_address(address)?;
        let mut buf = [0u8; 1];

        self.i2c
            .write_read(self.address, &[word], &mut buf)
            .map_err(|e| {
                error!("AT24C02 read at {} failed: {:?}", address, e.kind());
                StorageError::Bus {
                    operation: "read",
                    address,
                }
            })?;

        Ok(buf[0])
    }

    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError> {
        let word = Self::word_address(address)?;

        self.i2c.write(self.address, &[word, value]).map_err(|e| {
            error!("AT24C02 write at {} failed: {:?}", address, e.kind());
            StorageError::Bus {
                operation: "write",
                address,
            }
        })?;

        self.delay.delay_ms(EEPROM_WRITE_CYCLE_MS);
        Ok(())
    }
}
