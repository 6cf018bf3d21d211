//! Fixed-width reading record and its byte codec.
//!
//! Binary format (12 bytes, little-endian):
//! - sentinel: 1 byte (0xA5 for a written record)
//! - year: 2 bytes (u16)
//! - month, day, hour, minute, second: 1 byte each
//! - noise_db: 4 bytes (f32, IEEE-754)
//!
//! The layout is defined field by field here and never depends on the
//! in-memory representation of [`ReadingRecord`], so images written by one
//! build are readable by any other.

use core::fmt::Display;

use serde::Serialize;

use crate::clock::Timestamp;
use crate::config::RECORD_SENTINEL;

/// Encoded size of one record in bytes
pub const RECORD_SIZE: usize = 12;

const SENTINEL_OFFSET: usize = 0;
const YEAR_OFFSET: usize = 1;
const MONTH_OFFSET: usize = 3;
const DAY_OFFSET: usize = 4;
const HOUR_OFFSET: usize = 5;
const MINUTE_OFFSET: usize = 6;
const SECOND_OFFSET: usize = 7;
const NOISE_OFFSET: usize = 8;

/// One timestamped noise reading as persisted in the store.
///
/// Records are built once per stored second and never mutated afterwards.
/// A decoded record is only meaningful when [`ReadingRecord::is_valid`]
/// holds; the remaining fields are not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingRecord {
    /// Marker byte, equal to [`RECORD_SENTINEL`] for written records
    pub sentinel: u8,
    /// Time the reading was taken
    pub timestamp: Timestamp,
    /// Calibrated noise level in dB
    pub noise_db: f32,
}

impl ReadingRecord {
    /// Creates a record stamped with the sentinel.
    pub const fn new(timestamp: Timestamp, noise_db: f32) -> Self {
        Self {
            sentinel: RECORD_SENTINEL,
            timestamp,
            noise_db,
        }
    }

    /// Returns the encoded size of a record in bytes (12).
    pub const fn size() -> usize {
        RECORD_SIZE
    }

    /// Whether this record was written by the log rather than left over
    /// from erased or foreign store content.
    pub const fn is_valid(&self) -> bool {
        self.sentinel == RECORD_SENTINEL
    }

    /// Converts the record to its on-store byte form.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        let ts = &self.timestamp;

        bytes[SENTINEL_OFFSET] = self.sentinel;
        bytes[YEAR_OFFSET..YEAR_OFFSET + 2].copy_from_slice(&ts.year.to_le_bytes());
        bytes[MONTH_OFFSET] = ts.month;
        bytes[DAY_OFFSET] = ts.day;
        bytes[HOUR_OFFSET] = ts.hour;
        bytes[MINUTE_OFFSET] = ts.minute;
        bytes[SECOND_OFFSET] = ts.second;
        bytes[NOISE_OFFSET..NOISE_OFFSET + 4].copy_from_slice(&self.noise_db.to_le_bytes());

        bytes
    }

    /// Creates a record from its on-store byte form.
    ///
    /// Never fails: any 12 bytes decode to some record. Use
    /// [`ReadingRecord::is_valid`] to tell written records from noise.
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut year_bytes = [0u8; 2];
        year_bytes.copy_from_slice(&bytes[YEAR_OFFSET..YEAR_OFFSET + 2]);

        let mut noise_bytes = [0u8; 4];
        noise_bytes.copy_from_slice(&bytes[NOISE_OFFSET..NOISE_OFFSET + 4]);

        Self {
            sentinel: bytes[SENTINEL_OFFSET],
            timestamp: Timestamp {
                year: u16::from_le_bytes(year_bytes),
                month: bytes[MONTH_OFFSET],
                day: bytes[DAY_OFFSET],
                hour: bytes[HOUR_OFFSET],
                minute: bytes[MINUTE_OFFSET],
                second: bytes[SECOND_OFFSET],
            },
            noise_db: f32::from_le_bytes(noise_bytes),
        }
    }
}

impl Display for ReadingRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[Reading] {} {:.1} dB", self.timestamp, self.noise_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReadingRecord {
        ReadingRecord::new(Timestamp::new(2024, 1, 15, 10, 30, 45), 92.5)
    }

    #[test]
    fn test_record_size() {
        assert_eq!(ReadingRecord::size(), 12, "records must be exactly 12 bytes");
    }

    #[test]
    fn test_record_serialization() {
        let record = sample();
        let decoded = ReadingRecord::from_bytes(&record.to_bytes());

        assert_eq!(record, decoded);
        assert!(decoded.is_valid());
    }

    #[test]
    fn test_round_trip_at_field_limits() {
        let timestamps = [
            Timestamp::new(0, 0, 0, 0, 0, 0),
            Timestamp::new(u16::MAX, 255, 255, 255, 255, 255),
            Timestamp::new(1999, 12, 31, 23, 59, 59),
        ];
        let levels = [
            0.0,
            -0.0,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::MIN_POSITIVE,
            f32::MAX,
            -1e30,
        ];

        for timestamp in timestamps {
            for noise_db in levels {
                let record = ReadingRecord::new(timestamp, noise_db);
                let decoded = ReadingRecord::from_bytes(&record.to_bytes());

                assert_eq!(decoded.sentinel, record.sentinel);
                assert_eq!(decoded.timestamp, timestamp);
                // Bit comparison so -0.0 is told apart from 0.0
                assert_eq!(
                    decoded.noise_db.to_bits(),
                    noise_db.to_bits(),
                    "noise {} at {}",
                    noise_db,
                    timestamp
                );
            }
        }
    }

    #[test]
    fn test_arbitrary_bytes_survive_decode_encode() {
        // xorshift32, fixed seed
        let mut state = 0x9E37_79B9u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        let mut inputs = vec![[0x00; RECORD_SIZE], [0xFF; RECORD_SIZE], [0xA5; RECORD_SIZE]];
        for _ in 0..500 {
            let mut bytes = [0u8; RECORD_SIZE];
            for chunk in bytes.chunks_mut(4) {
                chunk.copy_from_slice(&next().to_le_bytes());
            }
            inputs.push(bytes);
        }

        for bytes in inputs {
            assert_eq!(ReadingRecord::from_bytes(&bytes).to_bytes(), bytes);
        }
    }

    #[test]
    fn test_byte_layout_is_stable() {
        let bytes = sample().to_bytes();
        let noise = 92.5f32.to_le_bytes();

        assert_eq!(
            bytes,
            [
                0xA5, 0xE8, 0x07, 1, 15, 10, 30, 45, noise[0], noise[1], noise[2], noise[3]
            ]
        );
    }

    #[test]
    fn test_erased_bytes_are_invalid() {
        assert!(!ReadingRecord::from_bytes(&[0xFF; RECORD_SIZE]).is_valid());
        assert!(!ReadingRecord::from_bytes(&[0x00; RECORD_SIZE]).is_valid());
    }

    #[test]
    fn test_validity_only_depends_on_first_byte() {
        for first in (0u8..=255).filter(|b| *b != RECORD_SENTINEL) {
            for fill in [0x00, 0x5A, 0xA5, 0xFF] {
                let mut bytes = [fill; RECORD_SIZE];
                bytes[0] = first;
                assert!(!ReadingRecord::from_bytes(&bytes).is_valid());
            }
        }

        // Garbage after a correct sentinel still passes: only the marker is checked.
        let mut garbled = [0x13; RECORD_SIZE];
        garbled[0] = RECORD_SENTINEL;
        assert!(ReadingRecord::from_bytes(&garbled).is_valid());
    }
}
