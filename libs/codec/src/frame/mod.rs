//! Protocol frame layer stack
//!
//! A frame is an ordered, statically composed chain of layers, innermost
//! being the terminal payload ([`DataLayer`]) and outermost whatever framing
//! the wire format requires first. Each layer owns the next layer in the
//! chain by value and contributes exactly one read/write/update step; any
//! scratch field a layer needs lives on the stack of the call, never in the
//! layer itself, so a stack value is freely shared across calls.
//!
//! The read path follows an explicit phase ordering:
//!
//! ```text
//! FRAME (framing fields parsed, message constructed)
//!   -> TRANSPORT-ASSIGN (transport values copied onto the message)
//!     -> BODY (the message's own read)
//! ```
//!
//! A split read performs the first two phases in `read_until_data` and the
//! body phase in `read_from_data`. Layer kinds that need their covered span
//! read as one atomic unit (checksum) refuse the split.

use std::sync::Arc;

use wire_types::{AnyMessage, FrameError, FrameResult, MsgId, MsgPtr, ReadCursor, UpdateCursor, WriteBuf};

use crate::registry::MsgRegistry;

mod checksum;
mod id;
mod payload;
mod size;
mod sync;
mod transport;

pub use checksum::{ChecksumLayer, ChecksumPlacement};
pub use id::IdLayer;
pub use payload::DataLayer;
pub use size::SizeLayer;
pub use sync::SyncLayer;
pub use transport::TransportValueLayer;

/// Which part of the read state machine a call executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    /// Framing, transport assignment and body in one call
    Full,
    /// Framing and transport assignment only; the payload span is recorded
    /// but the message body is not read
    UntilData,
    /// Body only; framing layers pass through untouched
    FromData,
}

/// Location of the payload within the buffer handed to `read`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSpan {
    pub offset: usize,
    pub len: usize,
}

/// Side-channel outputs captured during a read
///
/// Purely additive: every field is filled in as soon as the relevant layer
/// learns it, even if a later layer subsequently fails. The missing-byte
/// count for a short buffer rides in [`FrameError::NotEnoughData`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadInfo {
    /// Numeric ID parsed by the ID layer
    pub msg_id: Option<MsgId>,
    /// Ordinal of the candidate the ID layer settled on
    pub msg_idx: Option<usize>,
    /// Payload location captured by the data layer
    pub payload: Option<PayloadSpan>,
}

/// Result of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome {
    /// The frame is final as written
    Complete,
    /// Placeholder fields remain; the caller must run `update` with a
    /// random-access view over exactly the bytes just written
    UpdateRequired,
}

impl WriteOutcome {
    /// Combine this layer's outcome with an inner layer's
    pub fn merge(self, inner: WriteOutcome) -> WriteOutcome {
        match (self, inner) {
            (WriteOutcome::Complete, WriteOutcome::Complete) => WriteOutcome::Complete,
            _ => WriteOutcome::UpdateRequired,
        }
    }
}

/// One stage of a protocol frame, wrapping the next stage by value
pub trait FrameLayer {
    /// Read this layer's framing field, then delegate inward
    ///
    /// On success the cursor has advanced by exactly the bytes this layer's
    /// span consumed. On failure the cursor position marks where the error
    /// was detected.
    fn read(
        &self,
        slot: &mut Option<MsgPtr>,
        cur: &mut ReadCursor<'_>,
        info: &mut ReadInfo,
        phase: ReadPhase,
    ) -> FrameResult<()>;

    /// Derive and write this layer's field, then delegate inward
    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome>;

    /// Re-derive placeholder fields over a fully written frame
    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()>;

    /// Serialized frame length: this layer's field plus everything inside
    ///
    /// With `None` the data layer contributes nothing, yielding the fixed
    /// framing overhead.
    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize;

    /// Smallest frame this composition can produce (empty message body)
    fn min_frame_len(&self) -> usize;
}

/// Inflate a shortfall by the bytes the rest of the stack will need at minimum
///
/// Keeps the missing-byte estimate sufficient for the next read attempt
/// rather than merely non-zero: a caller that appends `missing` bytes must
/// not land on a second `NotEnoughData` for input this layer could have
/// anticipated.
pub(crate) fn widen_missing(err: FrameError, extra: usize) -> FrameError {
    match err {
        FrameError::NotEnoughData { missing, available } => FrameError::NotEnoughData {
            missing: missing + extra,
            available,
        },
        other => other,
    }
}

/// Application-facing facade over a composed layer chain
///
/// Owns the top layer by value and (optionally) the message registry, so
/// `create_msg` and frame reads resolve against the same candidate list.
#[derive(Debug)]
pub struct FrameStack<L> {
    top: L,
    registry: Option<Arc<MsgRegistry>>,
}

impl<L: FrameLayer> FrameStack<L> {
    pub fn new(top: L) -> Self {
        Self {
            top,
            registry: None,
        }
    }

    pub fn with_registry(top: L, registry: Arc<MsgRegistry>) -> Self {
        Self {
            top,
            registry: Some(registry),
        }
    }

    pub fn registry(&self) -> Option<&Arc<MsgRegistry>> {
        self.registry.as_ref()
    }

    /// Read one frame from `buf`, producing an owned message
    ///
    /// Returns the message and the side-channel info; the consumed byte
    /// count is available through [`Self::read_into`] when the caller needs
    /// to continue scanning a buffer.
    pub fn read(&self, buf: &[u8]) -> FrameResult<(MsgPtr, ReadInfo)> {
        let mut slot = None;
        let mut cur = ReadCursor::new(buf);
        let mut info = ReadInfo::default();
        self.read_into(&mut slot, &mut cur, &mut info)?;
        let msg = slot
            .take()
            .ok_or_else(|| FrameError::malformed(cur.pos(), "stack produced no message"))?;
        Ok((msg, info))
    }

    /// Read one frame through caller-managed cursor and slot
    ///
    /// If the slot is pre-populated the stack reads into the existing
    /// message instead of constructing one. A message the stack allocated
    /// itself is reset to empty on any failure, so no half-initialized
    /// message ever escapes an error path.
    pub fn read_into(
        &self,
        slot: &mut Option<MsgPtr>,
        cur: &mut ReadCursor<'_>,
        info: &mut ReadInfo,
    ) -> FrameResult<()> {
        let created_here = slot.is_none();
        match self.top.read(slot, cur, info, ReadPhase::Full) {
            Ok(()) => Ok(()),
            Err(err) => {
                if created_here {
                    *slot = None;
                }
                Err(err)
            }
        }
    }

    /// First half of a split read: framing and transport assignment only
    ///
    /// On success the returned slot holds the constructed message (if the
    /// composition has an ID layer) and `ReadInfo.payload` locates the
    /// unread body within `buf`. Compositions containing a checksum layer
    /// refuse the split with [`FrameError::SplitUnsupported`].
    pub fn read_until_data(&self, buf: &[u8]) -> FrameResult<(Option<MsgPtr>, ReadInfo)> {
        let mut slot = None;
        let mut cur = ReadCursor::new(buf);
        let mut info = ReadInfo::default();
        match self.top.read(&mut slot, &mut cur, &mut info, ReadPhase::UntilData) {
            Ok(()) => Ok((slot, info)),
            Err(err) => Err(err),
        }
    }

    /// Second half of a split read: the message body over the payload span
    pub fn read_from_data(&self, slot: &mut Option<MsgPtr>, payload: &[u8]) -> FrameResult<()> {
        let mut cur = ReadCursor::new(payload);
        let mut info = ReadInfo::default();
        self.top.read(slot, &mut cur, &mut info, ReadPhase::FromData)
    }

    /// Serialize `msg` through every layer
    pub fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        self.top.write(msg, out)
    }

    /// Finalization pass over a just-written frame
    pub fn update(&self, buf: &mut [u8]) -> FrameResult<()> {
        let mut cur = UpdateCursor::new(buf);
        self.top.update(None, &mut cur)
    }

    /// Finalization pass with the message available for re-derivation
    pub fn update_with_msg(&self, msg: &dyn AnyMessage, buf: &mut [u8]) -> FrameResult<()> {
        let mut cur = UpdateCursor::new(buf);
        self.top.update(Some(msg), &mut cur)
    }

    /// Full serialized length of `msg` including framing
    pub fn length(&self, msg: &dyn AnyMessage) -> usize {
        self.top.frame_len(Some(msg))
    }

    /// Framing overhead without a message body
    pub fn base_length(&self) -> usize {
        self.top.frame_len(None)
    }

    /// Construct a message from the attached registry
    pub fn create_msg(&self, id: MsgId, idx: usize) -> FrameResult<MsgPtr> {
        let registry = self.registry.as_ref().ok_or_else(|| FrameError::AllocFailure {
            id,
            reason: "no message registry attached to this stack".to_string(),
        })?;
        registry.create_msg(id, idx).map_err(FrameError::from)
    }
}
