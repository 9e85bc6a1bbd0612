//! Fixed-layout struct field backed by zerocopy
//!
//! Lets a message carry a plain-old-data body struct and serialize it
//! without per-member code: the struct's in-memory representation is the
//! wire representation. The struct must be `#[repr(C)]` with explicit
//! endianness handled by the application (fixed-layout structs are
//! little-endian on every supported target).

use super::Field;
use crate::cursor::{ReadCursor, WriteBuf};
use crate::error::{FrameError, FrameResult};
use std::mem::size_of;
use zerocopy::{AsBytes, FromBytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodField<T> {
    value: T,
}

impl<T: AsBytes + FromBytes + Copy> PodField<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: AsBytes + FromBytes + Copy + Default> Default for PodField<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
        }
    }
}

impl<T: AsBytes + FromBytes + Copy> Field for PodField<T> {
    type Value = T;

    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        let at = cur.pos();
        let bytes = cur.take(size_of::<T>())?;
        // read_from copes with arbitrary alignment of the source bytes
        self.value = T::read_from(bytes)
            .ok_or_else(|| FrameError::malformed(at, "pod body layout mismatch"))?;
        Ok(())
    }

    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()> {
        out.write_bytes(self.value.as_bytes())
    }

    fn length(&self) -> usize {
        size_of::<T>()
    }

    fn min_length(&self) -> usize {
        size_of::<T>()
    }

    fn max_length(&self) -> usize {
        size_of::<T>()
    }

    fn valid(&self) -> bool {
        true
    }

    fn value(&self) -> &T {
        &self.value
    }
}
