//! Checksum layer
//!
//! Covers the span produced by its inner layers with a checksum value,
//! carried either before the covered span (`Prefix`) or after it
//! (`Suffix`). Verification normally happens after the inner read has
//! consumed the span; verify-first mode hashes the span up front so corrupt
//! bytes never reach message deserialization, at the cost of requiring an
//! exact outer budget (e.g. an enclosing size layer).
//!
//! On sequential output the checksum cannot be computed inline, so a
//! placeholder is written and the whole write finishes `UpdateRequired`.
//!
//! Split reads are refused: the covered span must be consumed as one atomic
//! unit or the deferred verification would silently be skipped.

use tracing::{trace, warn};
use wire_types::{
    field::{encode_uint, Endian, Field, UintField},
    AnyMessage, FrameError, FrameResult, MsgPtr, ReadCursor, UpdateCursor, WriteBuf,
};

use crate::checksum::ChecksumAlgo;
use crate::config::FrameConfig;

use super::{widen_missing, FrameLayer, ReadInfo, ReadPhase, WriteOutcome};

/// Where the checksum value sits relative to the covered span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumPlacement {
    /// Value precedes the covered span
    Prefix,
    /// Value trails the covered span
    Suffix,
}

#[derive(Debug)]
pub struct ChecksumLayer<N> {
    algo: ChecksumAlgo,
    placement: ChecksumPlacement,
    endian: Endian,
    verify_first: bool,
    next: N,
}

impl<N> ChecksumLayer<N> {
    pub fn prefix(algo: ChecksumAlgo, next: N) -> Self {
        Self::with_config(algo, ChecksumPlacement::Prefix, &FrameConfig::default(), next)
    }

    pub fn suffix(algo: ChecksumAlgo, next: N) -> Self {
        Self::with_config(algo, ChecksumPlacement::Suffix, &FrameConfig::default(), next)
    }

    pub fn with_config(
        algo: ChecksumAlgo,
        placement: ChecksumPlacement,
        config: &FrameConfig,
        next: N,
    ) -> Self {
        Self {
            algo,
            placement,
            endian: Endian::Big,
            verify_first: config.verify_checksum_first,
            next,
        }
    }

    fn width(&self) -> usize {
        self.algo.width()
    }

    fn verify(&self, covered: &[u8], expected: u64) -> FrameResult<()> {
        let calculated = self.algo.compute(covered);
        if calculated != expected {
            warn!(
                expected,
                calculated,
                covered = covered.len(),
                algo = ?self.algo,
                "frame checksum mismatch"
            );
            return Err(FrameError::ChecksumMismatch {
                expected,
                calculated,
                covered: covered.len(),
            });
        }
        trace!(covered = covered.len(), algo = ?self.algo, "checksum verified");
        Ok(())
    }

    fn encoded(&self, value: u64) -> ([u8; 8], usize) {
        let mut bytes = [0u8; 8];
        let width = self.algo.width();
        encode_uint(value, self.endian, &mut bytes[..width]);
        (bytes, width)
    }
}

impl<N: FrameLayer> FrameLayer for ChecksumLayer<N> {
    fn read(
        &self,
        slot: &mut Option<MsgPtr>,
        cur: &mut ReadCursor<'_>,
        info: &mut ReadInfo,
        phase: ReadPhase,
    ) -> FrameResult<()> {
        match phase {
            ReadPhase::FromData => return self.next.read(slot, cur, info, phase),
            ReadPhase::UntilData => return Err(FrameError::SplitUnsupported),
            ReadPhase::Full => {}
        }

        let width = self.width();
        match self.placement {
            ChecksumPlacement::Prefix => {
                let mut field = UintField::new(width, self.endian);
                field
                    .read(cur)
                    .map_err(|e| widen_missing(e, self.next.min_frame_len()))?;
                let expected = field.get();
                let start = cur.pos();

                if self.verify_first {
                    let covered = cur
                        .slice(start, cur.limit())
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside buffer"))?;
                    self.verify(covered, expected)?;
                    self.next.read(slot, cur, info, phase)
                } else {
                    self.next.read(slot, cur, info, phase)?;
                    let covered = cur
                        .slice(start, cur.pos())
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside buffer"))?;
                    self.verify(covered, expected)
                }
            }
            ChecksumPlacement::Suffix => {
                if cur.remaining() < width {
                    return Err(FrameError::NotEnoughData {
                        missing: width + self.next.min_frame_len() - cur.remaining(),
                        available: cur.remaining(),
                    });
                }
                let start = cur.pos();
                let inner_budget = cur.remaining() - width;
                let field_at = start + inner_budget;

                if self.verify_first {
                    let covered = cur
                        .slice(start, field_at)
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside buffer"))?;
                    let raw = cur
                        .slice(field_at, field_at + width)
                        .ok_or_else(|| FrameError::malformed(field_at, "checksum field outside buffer"))?;
                    let expected = wire_types::field::decode_uint(raw, self.endian);
                    self.verify(covered, expected)?;
                }

                let saved = cur.push_limit(inner_budget)?;
                match self.next.read(slot, cur, info, phase) {
                    Ok(()) => {}
                    Err(err) => {
                        cur.pop_limit(saved);
                        return Err(err);
                    }
                }
                cur.skip_to_limit();
                cur.pop_limit(saved);

                let mut field = UintField::new(width, self.endian);
                field.read(cur)?;
                if !self.verify_first {
                    let covered = cur
                        .slice(start, field_at)
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside buffer"))?;
                    self.verify(covered, field.get())?;
                }
                Ok(())
            }
        }
    }

    fn write(&self, msg: &dyn AnyMessage, out: &mut dyn WriteBuf) -> FrameResult<WriteOutcome> {
        let width = self.width();
        let placeholder = [0u8; 8];

        match self.placement {
            ChecksumPlacement::Prefix => {
                if out.is_random_access() {
                    let at = out.pos();
                    out.write_bytes(&placeholder[..width])?;
                    let start = out.pos();
                    let outcome = self.next.write(msg, out)?;
                    let value = {
                        let covered = out
                            .written(start)
                            .ok_or_else(|| FrameError::malformed(start, "written span unavailable"))?;
                        self.algo.compute(covered)
                    };
                    let (bytes, width) = self.encoded(value);
                    out.patch(at, &bytes[..width])?;
                    Ok(outcome)
                } else {
                    out.write_bytes(&placeholder[..width])?;
                    let outcome = self.next.write(msg, out)?;
                    Ok(outcome.merge(WriteOutcome::UpdateRequired))
                }
            }
            ChecksumPlacement::Suffix => {
                let start = out.pos();
                let outcome = self.next.write(msg, out)?;
                if out.is_random_access() {
                    let value = {
                        let covered = out
                            .written(start)
                            .ok_or_else(|| FrameError::malformed(start, "written span unavailable"))?;
                        self.algo.compute(covered)
                    };
                    let (bytes, width) = self.encoded(value);
                    out.write_bytes(&bytes[..width])?;
                    Ok(outcome)
                } else {
                    out.write_bytes(&placeholder[..width])?;
                    Ok(outcome.merge(WriteOutcome::UpdateRequired))
                }
            }
        }
    }

    fn update(&self, msg: Option<&dyn AnyMessage>, cur: &mut UpdateCursor<'_>) -> FrameResult<()> {
        let width = self.width();
        match self.placement {
            ChecksumPlacement::Prefix => {
                let at = cur.pos();
                cur.advance(width)?;
                let start = cur.pos();
                let end = cur.limit();
                // Inner placeholders must be final before hashing the span.
                self.next.update(msg, cur)?;
                let value = {
                    let covered = cur
                        .slice(start, end)
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside frame"))?;
                    self.algo.compute(covered)
                };
                let (bytes, width) = self.encoded(value);
                cur.patch(at, &bytes[..width])
            }
            ChecksumPlacement::Suffix => {
                if cur.remaining() < width {
                    return Err(FrameError::malformed(
                        cur.pos(),
                        "frame too short for its checksum field",
                    ));
                }
                let start = cur.pos();
                let inner_span = cur.remaining() - width;
                let saved = cur.push_limit(inner_span)?;
                self.next.update(msg, cur)?;
                cur.skip_to_limit();
                cur.pop_limit(saved);

                let at = cur.pos();
                let value = {
                    let covered = cur
                        .slice(start, at)
                        .ok_or_else(|| FrameError::malformed(start, "covered span outside frame"))?;
                    self.algo.compute(covered)
                };
                let (bytes, width) = self.encoded(value);
                cur.patch(at, &bytes[..width])?;
                cur.advance(width)
            }
        }
    }

    fn frame_len(&self, msg: Option<&dyn AnyMessage>) -> usize {
        self.width() + self.next.frame_len(msg)
    }

    fn min_frame_len(&self) -> usize {
        self.width() + self.next.min_frame_len()
    }
}
