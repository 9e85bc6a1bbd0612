//! # Wirestack Primitives Library
//!
//! Shared primitives for composing binary communication protocols: byte
//! cursors, the field and message capability contracts, and the owned
//! message handle the frame stack hands back to callers.
//!
//! ## Design Philosophy
//!
//! - **Contracts, not representations**: higher layers depend on the
//!   [`Field`](field::Field) and [`Message`](message::Message) traits only,
//!   never on a concrete wire format
//! - **Explicit results**: every expected failure is a typed
//!   [`FrameError`](error::FrameError) value; no panics on wire input
//! - **Single-owner data flow**: one cursor threads a buffer traversal, one
//!   [`MsgPtr`](message::MsgPtr) owns a message produced during a read
//! - **Zero-copy where it pays**: fixed-layout bodies go through
//!   [`PodField`](field::PodField) backed by `zerocopy`
//!
//! ## Quick Start
//!
//! ```rust
//! use wire_types::cursor::ReadCursor;
//! use wire_types::field::{Endian, Field, UintField};
//!
//! let wire = [0x01, 0x02];
//! let mut cur = ReadCursor::new(&wire);
//! let mut size = UintField::new(2, Endian::Big);
//! size.read(&mut cur)?;
//! assert_eq!(size.get(), 0x0102);
//! # Ok::<(), wire_types::error::FrameError>(())
//! ```
//!
//! ## What This Crate Does NOT Contain
//!
//! - Protocol layer implementations (size/ID/checksum/sync framing) - those
//!   live in `wire-codec`
//! - Network transport or I/O sourcing of bytes - the caller's concern

pub mod cursor;
pub mod error;
pub mod field;
pub mod message;

// Re-export the types nearly every consumer touches
pub use cursor::{IoWriter, ReadCursor, SliceWriter, UpdateCursor, WriteBuf};
pub use error::{FrameError, FrameResult};
pub use field::{Endian, Field, PodField, UintField};
pub use message::{AnyMessage, GenericMessage, Message, MsgId, MsgPtr, StaticMsgId};
