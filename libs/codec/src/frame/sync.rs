//! Sync-marker layer
//!
//! A fixed constant at a known offset, used to detect stream
//! desynchronization before any other field is trusted. A mismatch is a
//! resynchronization signal: the caller should skip ahead and rescan rather
//! than feed more bytes.

use wire_types::{
    field::{Endian, Field, UintField},
    AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf,
};

use super::{widen_missing, FrameLayer, ReadInfo, ReadPhase, WriteOutcome};

#[derive(Debug)]
pub struct SyncLayer<N> {
    expected: u64,
    width: usize,
    endian: Endian,
    next: N,
}

impl<N> SyncLayer<N> {
    pub fn new(expected: u64, width: usize, endian: Endian, next: N) -> Self {
        Self {
            expected,
            width,
            endian,
            next,
        }
    }
}

impl<N: FrameLayer> FrameLayer for SyncLayer<N> {
    fn read(
        &self,
        slot: &mut Option<MsgPtr>,
        cur: &mut ReadCursor<'_>,
        info: &mut ReadInfo,
        phase: ReadPhase,
    ) -> FrameResult<()> {
        if phase == ReadPhase::FromData {
            return self.next.read(slot, cur, info, phase);
        }

        let mark = cur.pos();
        let mut field = UintField::new(self.width, self.endian);
        field
            .read(cur)
            .map_err(|e| widen_missing(e, self.next.min_frame_len()))?;
        if field.get() != self.expected {
            return Err(FrameError::SyncMismatch {
                expected: self.expected,
                actual: field.get(),
                offset: mark,
            });
        }
        self.next.read(slot, cur, info, phase)
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        let field = UintField::with_value(self.width, self.endian, self.expected);
        field.write(out)?;
        self.next.write(msg, out)
    }

    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
        // The marker is a constant; it was written final.
        cur.advance(self.width)?;
        self.next.update(msg, cur)
    }

    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize {
        self.width + self.next.frame_len(msg)
    }

    fn min_frame_len(&self) -> usize {
        self.width + self.next.min_frame_len()
    }
}
