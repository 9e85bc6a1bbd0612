//! # Wirestack Protocol Codec
//!
//! ## Purpose
//!
//! This crate contains the "rules" layer of the wirestack system:
//! - Frame layer compositions (sync, size, ID, checksum, transport value)
//! - Message factory and registry with ID-collision resolution
//! - Handler dispatch over dynamically typed messages
//! - Checksum algorithms and runtime framing policy
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types  →  [codec]       →  application
//!     ↑             ↓                 ↓
//! Pure Data    Protocol Rules    Handlers and
//! Structures   Framing/Dispatch  transport glue
//! ```
//!
//! A protocol is described once, as a value: layers nest by ownership, the
//! outermost layer wrapping the next all the way down to the terminal
//! payload stage. The same composition drives reading, writing, in-place
//! finalization and length computation.
//!
//! ## What This Crate Does NOT Contain
//! - Socket management or connection handling
//! - Raw field and message primitives (those live in `wire-types`)

pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod frame;
pub mod registry;

pub use checksum::ChecksumAlgo;
pub use config::FrameConfig;
pub use dispatch::{DispatchError, DispatchStrategy, Dispatcher, DispatcherBuilder};
pub use frame::{
    ChecksumLayer, ChecksumPlacement, DataLayer, FrameLayer, FrameStack, IdLayer, PayloadSpan,
    ReadInfo, ReadPhase, SizeLayer, SyncLayer, TransportValueLayer, WriteOutcome,
};
pub use registry::{CreateError, MsgEntry, MsgRegistry, MsgRegistryBuilder};

// Shared result alias re-exported for downstream convenience.
pub use wire_types::{FrameError, FrameResult};
