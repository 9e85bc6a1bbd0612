//! Checksum algorithms used by the checksum frame layer
//!
//! CRC-32 rides on hardware-accelerated `crc32fast`; the one-byte XOR and
//! additive variants cover small embedded-style frames where a full CRC is
//! overkill.

use num_enum::TryFromPrimitive;

/// Supported checksum algorithms, identified by a stable numeric tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ChecksumAlgo {
    /// XOR of every covered byte, 1-byte value
    Xor8 = 1,
    /// Wrapping sum of every covered byte, 1-byte value
    Sum8 = 2,
    /// CRC-32 (IEEE), 4-byte value
    Crc32 = 3,
}

impl ChecksumAlgo {
    /// Serialized width of the checksum value in bytes
    pub fn width(self) -> usize {
        match self {
            Self::Xor8 | Self::Sum8 => 1,
            Self::Crc32 => 4,
        }
    }

    /// Compute the checksum over `data`
    pub fn compute(self, data: &[u8]) -> u64 {
        match self {
            Self::Xor8 => data.iter().fold(0u8, |acc, &b| acc ^ b) as u64,
            Self::Sum8 => data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) as u64,
            Self::Crc32 => crc32fast::hash(data) as u64,
        }
    }
}
