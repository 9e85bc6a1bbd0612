//! Size (length-prefix) layer
//!
//! Reads an integer `N` and restricts the inner read to exactly `N` bytes.
//! If the inner read succeeds without consuming its whole budget, the
//! remaining bytes up to `N` are skipped. An inner "not enough data" after
//! the size field was itself read and satisfied is promoted to a hard
//! protocol error: the size field's promise was violated.

use wire_types::{
    field::{encode_uint, Endian, Field, UintField},
    AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf,
};

use crate::config::FrameConfig;

use super::{widen_missing, FrameLayer, ReadInfo, ReadPhase, WriteOutcome};

#[derive(Debug)]
pub struct SizeLayer<N> {
    width: usize,
    endian: Endian,
    max_frame_size: usize,
    next: N,
}

impl<N> SizeLayer<N> {
    pub fn new(width: usize, endian: Endian, next: N) -> Self {
        Self::with_config(width, endian, &FrameConfig::default(), next)
    }

    pub fn with_config(width: usize, endian: Endian, config: &FrameConfig, next: N) -> Self {
        Self {
            width,
            endian,
            max_frame_size: config.max_frame_size,
            next,
        }
    }
}

impl<N: FrameLayer> FrameLayer for SizeLayer<N> {
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
        let declared = field.get() as usize;

        if declared > self.max_frame_size {
            return Err(FrameError::malformed(
                mark,
                format!(
                    "declared size {declared} exceeds configured maximum {}",
                    self.max_frame_size
                ),
            ));
        }
        if cur.remaining() < declared {
            return Err(FrameError::NotEnoughData {
                missing: declared - cur.remaining(),
                available: cur.remaining(),
            });
        }

        let saved = cur.push_limit(declared)?;
        let result = match self.next.read(slot, cur, info, phase) {
            // The declared budget was fully present, so an inner shortfall
            // means the size field lied about its contents.
            Err(FrameError::NotEnoughData { .. }) => Err(FrameError::malformed(
                cur.pos(),
                "inner frame needs more bytes than the size field declared",
            )),
            other => other,
        };
        if result.is_ok() {
            cur.skip_to_limit();
        }
        cur.pop_limit(saved);
        result
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        let declared = self.next.frame_len(Some(msg));
        let field = UintField::with_value(self.width, self.endian, declared as u64);
        field.write(out)?;
        self.next.write(msg, out)
    }

    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
        let at = cur.pos();
        cur.advance(self.width)?;
        let declared = cur.remaining();
        if self.width < 8 && declared >= 1usize << (8 * self.width) {
            return Err(FrameError::malformed(
                at,
                format!("frame length {declared} does not fit a {}-byte size field", self.width),
            ));
        }
        let mut bytes = [0u8; 8];
        encode_uint(declared as u64, self.endian, &mut bytes[..self.width]);
        cur.patch(at, &bytes[..self.width])?;
        self.next.update(msg, cur)
    }

    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize {
        self.width + self.next.frame_len(msg)
    }

    fn min_frame_len(&self) -> usize {
        self.width + self.next.min_frame_len()
    }
}
