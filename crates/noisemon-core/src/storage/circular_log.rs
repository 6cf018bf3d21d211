//! Append-only record log over a fixed-size byte store.
//!
//! Records are laid end to end from address 0. The write cursor wraps back
//! to 0 once the space left after it cannot hold a whole record, so the
//! tail of the store shorter than one record is never used. With the
//! 256-byte AT24C02 that gives 21 slots (addresses 0, 12, ... 240) and a
//! 4-byte unused tail.
//!
//! ## Known limitations
//!
//! - The cursor lives in RAM only. After a restart the log overwrites from
//!   address 0 again instead of resuming after the newest record.
//! - [`CircularLog::scan_all`] returns records in address order. Once the
//!   cursor has wrapped this is no longer the order they were written in.
//! - Validity is the sentinel byte alone, so a record torn by a power loss
//!   after its first byte was written is reported as valid.

use heapless::Vec;
use log::{debug, error, info, warn};

use super::record::{RECORD_SIZE, ReadingRecord};
use super::{ByteStore, StorageError};
use crate::config::RECORD_SENTINEL;

/// Circular log of [`ReadingRecord`]s.
pub struct CircularLog<S: ByteStore> {
    store: S,
    /// Address of the next append. Always a multiple of [`RECORD_SIZE`] and
    /// never above `capacity - RECORD_SIZE`.
    cursor: usize,
}

impl<S: ByteStore> CircularLog<S> {
    /// Wrap a store, starting with the cursor at address 0.
    pub fn new(store: S) -> Result<Self, StorageError> {
        let capacity = store.capacity();
        if capacity < RECORD_SIZE {
            return Err(StorageError::CapacityTooSmall {
                capacity,
                record_size: RECORD_SIZE,
            });
        }

        Ok(Self { store, cursor: 0 })
    }

    /// Check that the store actually retains writes.
    ///
    /// Writes the sentinel to address 0 and reads it back. The byte that was
    /// there before is put back afterwards, also when the read-back failed,
    /// so the probe never leaves a valid-looking record on a blank store. A
    /// failed restore is retried once before its error is returned.
    pub fn probe(&mut self) -> Result<(), StorageError> {
        let previous = self.store.read_byte(0)?;
        self.store.write_byte(0, RECORD_SENTINEL)?;

        let checked = self.store.read_byte(0).and_then(|found| {
            if found == RECORD_SENTINEL {
                return Ok(());
            }
            error!(
                "Store probe failed: wrote {:#04x}, read back {:#04x}",
                RECORD_SENTINEL, found
            );
            Err(StorageError::ProbeFailed {
                expected: RECORD_SENTINEL,
                found,
            })
        });

        let restored = if previous == RECORD_SENTINEL {
            Ok(())
        } else {
            self.restore_first_byte(previous)
        };

        checked?;
        restored?;

        info!(
            "Store probe passed ({} bytes, {} record slots)",
            self.store.capacity(),
            self.slot_count()
        );
        Ok(())
    }

    fn restore_first_byte(&mut self, previous: u8) -> Result<(), StorageError> {
        self.store.write_byte(0, previous).or_else(|e| {
            warn!("Restoring address 0 failed ({}), retrying", e);
            self.store.write_byte(0, previous)
        })
    }

    /// Write one record at the cursor and advance it.
    ///
    /// Bytes go out one store write at a time in ascending address order.
    /// The cursor only moves once all of them were accepted, so a failed
    /// write leaves it pointing at the same slot. There is no rate limit
    /// here; callers decide how often to append.
    pub fn append(&mut self, record: &ReadingRecord) -> Result<(), StorageError> {
        let address = self.cursor;
        let bytes = record.to_bytes();

        for (offset, byte) in bytes.iter().enumerate() {
            self.store.write_byte(address + offset, *byte)?;
        }

        self.cursor += RECORD_SIZE;
        if self.cursor + RECORD_SIZE > self.store.capacity() {
            debug!("Log cursor wrapped after slot at {}", address);
            self.cursor = 0;
        }

        debug!("Appended {} at {}", record, address);
        Ok(())
    }

    /// Reconstruct up to `max_count` valid records by scanning the whole store.
    ///
    /// The result is additionally bounded by the capacity `N` of the returned
    /// vector. Slots whose sentinel does not match are skipped and do not
    /// count toward the limit.
    pub fn scan_all<const N: usize>(
        &mut self,
        max_count: usize,
    ) -> Result<Vec<ReadingRecord, N>, StorageError> {
        let limit = max_count.min(N);
        let capacity = self.store.capacity();
        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut address = 0;

        while address + RECORD_SIZE <= capacity && records.len() < limit {
            let record = self.read_record(address)?;
            if record.is_valid() {
                if records.push(record).is_err() {
                    break;
                }
            } else {
                skipped += 1;
            }
            address += RECORD_SIZE;
        }

        debug!(
            "Scan found {} valid records, skipped {} slots",
            records.len(),
            skipped
        );
        Ok(records)
    }

    /// Read and decode the record slot starting at `address`.
    pub fn read_record(&mut self, address: usize) -> Result<ReadingRecord, StorageError> {
        let mut bytes = [0u8; RECORD_SIZE];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = self.store.read_byte(address + offset)?;
        }
        Ok(ReadingRecord::from_bytes(&bytes))
    }

    /// Address the next record will be written to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of whole records the store can hold
    pub fn slot_count(&self) -> usize {
        self.store.capacity() / RECORD_SIZE
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give back the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }
}
