//! Field contract - the minimal capability every data element provides
//!
//! Layers and messages only ever talk to fields through this contract; they
//! never assume a concrete wire representation. The invariant for any field
//! state reachable through normal mutation is
//! `min_length() <= length() <= max_length()`.

use crate::cursor::{ReadCursor, WriteBuf};
use crate::error::FrameResult;

mod pod;
mod uint;

pub use pod::PodField;
pub use uint::UintField;

/// Byte order of a multi-byte wire value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Big,
    Little,
}

/// A single serializable value with read/write/length/validity operations
pub trait Field {
    /// Semantic value type held by the field
    type Value;

    /// Deserialize the field from the cursor, consuming exactly `length()` bytes on success
    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()>;

    /// Serialize the field's current value
    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()>;

    /// Serialized length of the current value
    fn length(&self) -> usize;

    /// Smallest serialized length any value of this field can have
    fn min_length(&self) -> usize;

    /// Largest serialized length any value of this field can have
    fn max_length(&self) -> usize;

    /// Whether the current value is valid for this field's constraints
    fn valid(&self) -> bool;

    /// Recompute any derived state; returns true if the value changed
    fn refresh(&mut self) -> bool {
        false
    }

    /// Access the current value
    fn value(&self) -> &Self::Value;
}

/// Decode an unsigned integer of up to 8 bytes
pub fn decode_uint(bytes: &[u8], endian: Endian) -> u64 {
    debug_assert!(bytes.len() <= 8);
    match endian {
        Endian::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        Endian::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64),
    }
}

/// Encode an unsigned integer into `width` bytes of `out`
pub fn encode_uint(value: u64, endian: Endian, out: &mut [u8]) {
    let width = out.len();
    debug_assert!(width <= 8);
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = match endian {
            Endian::Big => 8 * (width - 1 - i),
            Endian::Little => 8 * i,
        };
        *slot = (value >> shift) as u8;
    }
}
