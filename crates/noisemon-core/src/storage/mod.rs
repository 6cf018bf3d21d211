//! Non-volatile storage: the byte store contract, the record codec, and the
//! circular log built on top of them.

pub mod at24c02;
pub mod circular_log;
pub mod ram;
pub mod record;

pub use at24c02::At24c02;
pub use circular_log::CircularLog;
pub use ram::RamStore;
pub use record::{RECORD_SIZE, ReadingRecord};

use thiserror_no_std::Error;

/// Byte-addressable non-volatile memory.
///
/// Every access is a single byte; implementations do no buffering and give no
/// atomicity guarantees beyond one byte. Addresses run over
/// `0..self.capacity()`.
pub trait ByteStore {
    /// Number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read one byte
    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError>;

    /// Write one byte, blocking until the store has committed it
    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError>;
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError> {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError> {
        (**self).write_byte(address, value)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("store bus error during {operation} at address {address}")]
    Bus {
        operation: &'static str,
        address: usize,
    },
    #[error("address {address} outside store capacity {capacity}")]
    AddressOutOfRange { address: usize, capacity: usize },
    #[error("store of {capacity} bytes cannot hold a {record_size}-byte record")]
    CapacityTooSmall { capacity: usize, record_size: usize },
    #[error("store probe failed: wrote {expected:#04x}, read back {found:#04x}")]
    ProbeFailed { expected: u8, found: u8 },
}
