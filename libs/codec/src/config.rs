//! Frame processing configuration
//!
//! Policy knobs consumed by the frame layers. Serde-serializable so
//! applications can load the policy from their own configuration files.

use serde::{Deserialize, Serialize};

/// Policy applied by the size, checksum and ID layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Verify the checksum before running the inner read instead of after
    ///
    /// The default verifies after the inner read, matching the wire order.
    /// Verify-first trades an extra pass over the payload for never handing
    /// corrupt bytes to message deserialization.
    pub verify_checksum_first: bool,

    /// Upper bound a size layer accepts for the declared inner length
    ///
    /// A declared length above this is reported as a malformed frame rather
    /// than an absurd `NotEnoughData` request.
    pub max_frame_size: usize,

    /// Let the ID layer fall back to the registry's generic message when no
    /// registered candidate can read the frame
    pub allow_fallback_msg: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            verify_checksum_first: false,
            max_frame_size: 1 << 20,
            allow_fallback_msg: true,
        }
    }
}
