//! Transport-value layer
//!
//! Carries a per-message metadata value that belongs to the framing rather
//! than the message body, stored in one of the message's extra transport
//! slots. The value is assigned before the body read runs, so body parsing
//! may depend on it (e.g. a version field selecting a body variant).
//!
//! A pseudo layer participates in the exchange without occupying wire
//! bytes: on read it synthesizes a configured constant, on write it emits
//! nothing.

use wire_types::{
    field::{Endian, Field, UintField},
    AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf,
};

use super::{widen_missing, FrameLayer, ReadInfo, ReadPhase, WriteOutcome};

#[derive(Debug)]
pub struct TransportValueLayer<N> {
    slot_index: usize,
    width: usize,
    endian: Endian,
    pseudo_value: Option<u64>,
    next: N,
}

impl<N> TransportValueLayer<N> {
    pub fn new(slot_index: usize, width: usize, endian: Endian, next: N) -> Self {
        Self {
            slot_index,
            width,
            endian,
            pseudo_value: None,
            next,
        }
    }

    /// A layer that assigns `value` without reading or writing wire bytes
    pub fn pseudo(slot_index: usize, value: u64, next: N) -> Self {
        Self {
            slot_index,
            width: 0,
            endian: Endian::Big,
            pseudo_value: Some(value),
            next,
        }
    }

    fn wire_width(&self) -> usize {
        if self.pseudo_value.is_some() {
            0
        } else {
            self.width
        }
    }
}

impl<N: FrameLayer> FrameLayer for TransportValueLayer<N> {
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

        let value = match self.pseudo_value {
            Some(v) => v,
            None => {
                let mut field = UintField::new(self.width, self.endian);
                field
                    .read(cur)
                    .map_err(|e| widen_missing(e, self.next.min_frame_len()))?;
                field.get()
            }
        };

        // Assignment must happen before the body read, which means the
        // message has to exist by this point in the chain.
        let msg = slot.as_mut().ok_or(FrameError::TransportAssign {
            slot: self.slot_index,
        })?;
        if !msg.set_transport_value(self.slot_index, value) {
            return Err(FrameError::TransportAssign {
                slot: self.slot_index,
            });
        }
        self.next.read(slot, cur, info, phase)
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        let value = msg
            .transport_value(self.slot_index)
            .ok_or(FrameError::TransportAssign {
                slot: self.slot_index,
            })?;
        if self.pseudo_value.is_none() {
            let field = UintField::with_value(self.width, self.endian, value);
            field.write(out)?;
        }
        self.next.write(msg, out)
    }

    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
        cur.advance(self.wire_width())?;
        self.next.update(msg, cur)
    }

    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize {
        self.wire_width() + self.next.frame_len(msg)
    }

    fn min_frame_len(&self) -> usize {
        self.wire_width() + self.next.min_frame_len()
    }
}
