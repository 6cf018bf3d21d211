//! RAM-backed byte store

use super::{ByteStore, StorageError};

/// Value of a freshly erased EEPROM cell
pub const ERASED_BYTE: u8 = 0xFF;

/// Byte store backed by a RAM array.
///
/// Starts out erased (all 0xFF) like a blank EEPROM. Used by tests and as the
/// in-memory image for host builds.
#[derive(Debug, Clone)]
pub struct RamStore<const N: usize> {
    bytes: [u8; N],
    writes: usize,
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStore<N> {
    /// Create an erased store.
    pub const fn new() -> Self {
        Self::from_image([ERASED_BYTE; N])
    }

    /// Create a store holding a previously saved image.
    pub const fn from_image(bytes: [u8; N]) -> Self {
        Self { bytes, writes: 0 }
    }

    /// Raw contents of the store
    pub fn image(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Mutable raw contents, for simulating corruption in tests
    pub fn image_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }

    /// Number of single-byte writes performed since creation
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn check(&self, address: usize) -> Result<(), StorageError> {
        if address >= N {
            return Err(StorageError::AddressOutOfRange {
                address,
                capacity: N,
            });
        }
        Ok(())
    }
}

impl<const N: usize> ByteStore for RamStore<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read_byte(&mut self, address: usize) -> Result<u8, StorageError> {
        self.check(address)?;
        Ok(self.bytes[address])
    }

    fn write_byte(&mut self, address: usize, value: u8) -> Result<(), StorageError> {
        self.check(address)?;
        self.bytes[address] = value;
        self.writes += 1;
        Ok(())
    }
}
