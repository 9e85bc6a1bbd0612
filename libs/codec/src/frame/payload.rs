//! Terminal payload layer
//!
//! The innermost stage of every composition: delegates directly to the
//! message object's own read/write and contributes no framing bytes of its
//! own. Captures the payload location for the side-channel outputs.

use wire_types::{AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf};

use super::{FrameLayer, PayloadSpan, ReadInfo, ReadPhase, WriteOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct DataLayer;

impl FrameLayer for DataLayer {
    fn read(
        &self,
        slot: &mut Option<MsgPtr>,
        cur: &mut ReadCursor<'_>,
        info: &mut ReadInfo,
        phase: ReadPhase,
    ) -> FrameResult<()> {
        info.payload = Some(PayloadSpan {
            offset: cur.pos(),
            len: cur.remaining(),
        });
        if phase == ReadPhase::UntilData {
            return Ok(());
        }
        let msg = slot
            .as_mut()
            .ok_or_else(|| FrameError::malformed(cur.pos(), "no message available for payload read"))?;
        msg.read(cur)
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        msg.write(out)?;
        Ok(WriteOutcome::Complete)
    }

    fn update(&self, _msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
        // The body was written final; nothing to patch.
        cur.skip_to_limit();
        Ok(())
    }

    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize {
        msg.map(|m| m.length()).unwrap_or(0)
    }

    fn min_frame_len(&self) -> usize {
        0
    }
}
