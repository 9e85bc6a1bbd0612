//! Message-ID prefix layer
//!
//! Reads the numeric identifier, asks the registry for the candidate
//! message type(s) registered under it, and delegates inward with the
//! constructed message in the slot. Identifier collisions are resolved by
//! re-attempting the inner read per candidate ordinal, rewinding the cursor
//! between attempts. When no candidate can be both constructed and read,
//! the registry's generic fallback (if enabled) captures the frame instead.

use std::sync::Arc;

use tracing::trace;
use wire_types::{
    field::{Endian, Field, UintField},
    AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf,
};

use crate::config::FrameConfig;
use crate::registry::MsgRegistry;

use super::{widen_missing, FrameLayer, ReadInfo, ReadPhase, WriteOutcome};

#[derive(Debug)]
pub struct IdLayer<N> {
    width: usize,
    endian: Endian,
    registry: Arc<MsgRegistry>,
    allow_fallback: bool,
    next: N,
}

impl<N> IdLayer<N> {
    pub fn new(width: usize, endian: Endian, registry: Arc<MsgRegistry>, next: N) -> Self {
        Self::with_config(width, endian, registry, &FrameConfig::default(), next)
    }

    pub fn with_config(
        width: usize,
        endian: Endian,
        registry: Arc<MsgRegistry>,
        config: &FrameConfig,
        next: N,
    ) -> Self {
        Self {
            width,
            endian,
            registry,
            allow_fallback: config.allow_fallback_msg,
            next,
        }
    }

    fn fallback(&self, id: u64) -> Option<MsgPtr> {
        if !self.allow_fallback {
            return None;
        }
        self.registry.fallback_msg(id)
    }
}

impl<N: FrameLayer> FrameLayer for IdLayer<N> {
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

        let mut field = UintField::new(self.width, self.endian);
        field
            .read(cur)
            .map_err(|e| widen_missing(e, self.next.min_frame_len()))?;
        let id = field.get();
        info.msg_id = Some(id);

        // A pre-populated slot means the caller selected the message; the
        // wire ID still has to agree with it.
        if let Some(existing) = slot.as_ref() {
            if existing.msg_id() != id {
                return Err(FrameError::InvalidMsgId { id });
            }
            return self.next.read(slot, cur, info, phase);
        }

        let count = self.registry.candidate_count(id);
        if count == 0 {
            if let Some(fallback) = self.fallback(id) {
                *slot = Some(fallback);
                return self.next.read(slot, cur, info, phase);
            }
            return Err(FrameError::InvalidMsgId { id });
        }

        let mark = cur.pos();
        let mut last_err = None;
        for idx in 0..count {
            cur.rewind_to(mark);
            let msg = self.registry.create_msg(id, idx).map_err(FrameError::from)?;
            *slot = Some(msg);
            info.msg_idx = Some(idx);
            match self.next.read(slot, cur, info, phase) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    trace!(id, idx, %err, "candidate message failed to read");
                    *slot = None;
                    info.msg_idx = None;
                    last_err = Some(err);
                }
            }
        }

        if let Some(fallback) = self.fallback(id) {
            cur.rewind_to(mark);
            *slot = Some(fallback);
            return self.next.read(slot, cur, info, phase);
        }
        // All candidates were tried; surface the last attempt's failure.
        Err(last_err.unwrap_or(FrameError::InvalidMsgId { id }))
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        let field = UintField::with_value(self.width, self.endian, msg.msg_id());
        field.write(out)?;
        self.next.write(msg, out)
    }

    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
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
