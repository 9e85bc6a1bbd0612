//! Frame-level errors for protocol stack processing
//!
//! Every expected failure path in the stack is an explicit `Result` value.
//! Each variant carries enough context to act on the failure without a
//! debugger: byte counts for recoverable shortfalls, expected/actual pairs
//! for integrity failures, offsets for structural violations.

use thiserror::Error;

/// Result type for frame operations
pub type FrameResult<T> = std::result::Result<T, FrameError>;

/// Errors produced while reading, writing or updating a frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer does not yet contain enough bytes to finish the operation.
    ///
    /// Recoverable: append at least `missing` more bytes and retry. The
    /// estimate is sufficient for the next attempt, not merely non-zero.
    #[error("not enough data: need at least {missing} more bytes (have {available})")]
    NotEnoughData { missing: usize, available: usize },

    /// A sync-marker field did not hold the expected constant
    #[error("sync marker mismatch at offset {offset}: expected {expected:#x}, got {actual:#x}")]
    SyncMismatch {
        expected: u64,
        actual: u64,
        offset: usize,
    },

    /// Checksum verification failed over the covered span
    #[error("checksum mismatch: expected {expected:#x}, calculated {calculated:#x} over {covered} bytes")]
    ChecksumMismatch {
        expected: u64,
        calculated: u64,
        covered: usize,
    },

    /// Structurally invalid frame content detected after enough bytes were read
    #[error("malformed frame at offset {offset}: {context}")]
    Malformed { offset: usize, context: String },

    /// The ID layer parsed an identifier no registered message type claims
    #[error("invalid message id {id:#x}")]
    InvalidMsgId { id: u64 },

    /// A write operation ran out of destination space
    #[error("output buffer overflow: need {need} more bytes")]
    BufferOverflow { need: usize },

    /// The message factory could not construct an object
    #[error("message allocation failed for id {id:#x}: {reason}")]
    AllocFailure { id: u64, reason: String },

    /// A transport-value layer could not assign its value to the message
    #[error("transport value could not be assigned to message slot {slot}")]
    TransportAssign { slot: usize },

    /// The layer composition does not allow a split read at this point
    #[error("split read is not supported by this layer composition")]
    SplitUnsupported,

    /// An underlying sink failed while writing
    #[error("i/o failure while writing frame: {context}")]
    Io { context: String },
}

impl FrameError {
    /// Create a `Malformed` error with positional context
    pub fn malformed(offset: usize, context: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            context: context.into(),
        }
    }

    /// Shortfall helper: `need` bytes wanted, `available` on hand
    pub fn not_enough(need: usize, available: usize) -> Self {
        Self::NotEnoughData {
            missing: need.saturating_sub(available).max(1),
            available,
        }
    }

    /// True for errors the caller can clear by supplying more input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotEnoughData { .. })
    }

    /// True for integrity/structure violations that require resynchronization
    ///
    /// More input will not help; the caller should skip ahead and rescan for
    /// the next frame boundary.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::SyncMismatch { .. } | Self::ChecksumMismatch { .. } | Self::Malformed { .. }
        )
    }
}
