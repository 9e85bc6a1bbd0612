//! Message contract - an ordered bundle of fields with identity metadata
//!
//! A message exposes the same read/write/length/valid surface as a field,
//! implemented by folding over its fields, plus a numeric identifier and
//! optional extra transport-field slots (per-message metadata threaded in
//! from a transport layer rather than carried in the normal body).
//!
//! Ownership is single-owner throughout: a message produced during a frame
//! read is handed to the caller as a [`MsgPtr`]; no layer retains a
//! reference to it after the call returns.

use crate::cursor::{ReadCursor, WriteBuf};
use crate::error::FrameResult;
use std::any::Any;

/// Numeric message identifier as carried on the wire
pub type MsgId = u64;

/// Capability contract every concrete message type implements
pub trait Message: std::fmt::Debug {
    /// The wire identifier of this message
    fn msg_id(&self) -> MsgId;

    /// Deserialize the message body from the cursor
    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()>;

    /// Serialize the message body
    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()>;

    /// Serialized body length for the current field values
    fn length(&self) -> usize;

    /// Message validity = conjunction of all field validities
    fn valid(&self) -> bool {
        true
    }

    /// Recompute derived fields; returns true if anything changed
    fn refresh(&mut self) -> bool {
        false
    }

    /// Store a transport-layer value into extra slot `slot`
    ///
    /// Returns false when the message has no such slot. The body read may
    /// depend on a value assigned here, which is why transport assignment
    /// always precedes the body read in the frame stack.
    fn set_transport_value(&mut self, slot: usize, value: u64) -> bool {
        let _ = (slot, value);
        false
    }

    /// Read back a transport slot for serialization
    fn transport_value(&self, slot: usize) -> Option<u64> {
        let _ = slot;
        None
    }
}

/// Object-safe message handle with downcast support
pub trait AnyMessage: Message + Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Message + Any + Send> AnyMessage for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AnyMessage {
    pub fn downcast_ref<T: AnyMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: AnyMessage>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Single-owner handle to a dynamically typed message
pub type MsgPtr = Box<dyn AnyMessage>;

/// Compile-time message identifier, required for registry registration
pub trait StaticMsgId {
    const MSG_ID: MsgId;
}

/// Fallback message capturing the raw body of frames with an unknown ID
///
/// Produced by the factory when the application opts into fallback behavior
/// instead of failing a read outright on an unregistered identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenericMessage {
    id: MsgId,
    payload: Vec<u8>,
}

impl GenericMessage {
    pub fn new(id: MsgId) -> Self {
        Self {
            id,
            payload: Vec::new(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }
}

impl Message for GenericMessage {
    fn msg_id(&self) -> MsgId {
        self.id
    }

    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        let n = cur.remaining();
        self.payload = cur.take(n)?.to_vec();
        Ok(())
    }

    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()> {
        out.write_bytes(&self.payload)
    }

    fn length(&self) -> usize {
        self.payload.len()
    }
}
