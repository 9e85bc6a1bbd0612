//! Fixed-width unsigned integer field
//!
//! The workhorse carrier for size prefixes, message IDs, sync markers and
//! checksum values. Width is 1..=8 bytes with either byte order.

use super::{decode_uint, encode_uint, Endian, Field};
use crate::cursor::{ReadCursor, WriteBuf};
use crate::error::{FrameError, FrameResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UintField {
    width: usize,
    endian: Endian,
    value: u64,
}

impl UintField {
    /// Create a zero-valued field. Panics if `width` is not in 1..=8.
    pub fn new(width: usize, endian: Endian) -> Self {
        assert!((1..=8).contains(&width), "uint field width must be 1..=8");
        Self {
            width,
            endian,
            value: 0,
        }
    }

    pub fn with_value(width: usize, endian: Endian, value: u64) -> Self {
        let mut f = Self::new(width, endian);
        f.value = value;
        f
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn set(&mut self, value: u64) {
        self.value = value;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }
}

impl Field for UintField {
    type Value = u64;

    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        let bytes = cur.take(self.width)?;
        self.value = decode_uint(bytes, self.endian);
        Ok(())
    }

    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()> {
        if !self.valid() {
            return Err(FrameError::malformed(
                out.pos(),
                format!("value {:#x} does not fit in {} bytes", self.value, self.width),
            ));
        }
        let mut buf = [0u8; 8];
        encode_uint(self.value, self.endian, &mut buf[..self.width]);
        out.write_bytes(&buf[..self.width])
    }

    fn length(&self) -> usize {
        self.width
    }

    fn min_length(&self) -> usize {
        self.width
    }

    fn max_length(&self) -> usize {
        self.width
    }

    fn valid(&self) -> bool {
        self.width == 8 || self.value < (1u64 << (8 * self.width))
    }

    fn value(&self) -> &u64 {
        &self.value
    }
}
