//! Message types shared by the integration suites

#![allow(dead_code)]

use wire_types::{FrameError, FrameResult, Message, MsgId, ReadCursor, StaticMsgId, WriteBuf};

/// Empty-body keepalive
#[derive(Debug, Default, PartialEq)]
pub struct Ping;

impl StaticMsgId for Ping {
    const MSG_ID: MsgId = 0x01;
}

impl Message for Ping {
    fn msg_id(&self) -> MsgId {
        Self::MSG_ID
    }
    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        if cur.remaining() != 0 {
            return Err(FrameError::malformed(cur.pos(), "ping carries no body"));
        }
        Ok(())
    }
    fn write(&self, _out: &mut dyn WriteBuf) -> FrameResult<()> {
        Ok(())
    }
    fn length(&self) -> usize {
        0
    }
}

/// Two-byte big-endian counter echo
#[derive(Debug, Default, PartialEq)]
pub struct Pong {
    pub counter: u16,
}

impl StaticMsgId for Pong {
    const MSG_ID: MsgId = 0x02;
}

impl Message for Pong {
    fn msg_id(&self) -> MsgId {
        Self::MSG_ID
    }
    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        let raw = cur.take(2)?;
        self.counter = u16::from_be_bytes([raw[0], raw[1]]);
        Ok(())
    }
    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()> {
        out.write_bytes(&self.counter.to_be_bytes())
    }
    fn length(&self) -> usize {
        2
    }
}

/// Body whose layout is selected by a transport-assigned version slot
#[derive(Debug, Default, PartialEq)]
pub struct Versioned {
    pub version: Option<u64>,
    pub body: u8,
}

impl StaticMsgId for Versioned {
    const MSG_ID: MsgId = 0x30;
}

impl Message for Versioned {
    fn msg_id(&self) -> MsgId {
        Self::MSG_ID
    }
    fn read(&mut self, cur: &mut ReadCursor<'_>) -> FrameResult<()> {
        if self.version.is_none() {
            return Err(FrameError::malformed(cur.pos(), "body read before version"));
        }
        self.body = cur.take(1)?[0];
        Ok(())
    }
    fn write(&self, out: &mut dyn WriteBuf) -> FrameResult<()> {
        out.write_bytes(&[self.body])
    }
    fn length(&self) -> usize {
        1
    }
    fn set_transport_value(&mut self, slot: usize, value: u64) -> bool {
        if slot != 0 {
            return false;
        }
        self.version = Some(value);
        true
    }
    fn transport_value(&self, slot: usize) -> Option<u64> {
        if slot == 0 {
            self.version
        } else {
            None
        }
    }
}
