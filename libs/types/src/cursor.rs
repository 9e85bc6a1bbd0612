//! Byte cursors threaded through the frame stack
//!
//! A single logical buffer traversal uses one cursor value passed down the
//! whole layer chain. [`ReadCursor`] walks an input slice under a nestable
//! length budget, [`WriteBuf`] abstracts over random-access and sequential
//! output destinations, and [`UpdateCursor`] revisits a just-written frame
//! to patch placeholder fields during the finalization pass.

use crate::error::{FrameError, FrameResult};

/// Forward read cursor over a borrowed byte slice with a narrowable limit
///
/// Layers narrow the limit (`push_limit`) to hand inner layers a reduced
/// byte budget, and restore it (`pop_limit`) when the inner call returns.
/// Positions are absolute offsets into the underlying buffer, so a recorded
/// position stays meaningful across rewinds.
#[derive(Debug)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            limit: buf.len(),
        }
    }

    /// Absolute position of the next unread byte
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current budget end (absolute offset)
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left inside the current budget
    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// Consume exactly `n` bytes
    pub fn take(&mut self, n: usize) -> FrameResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(FrameError::NotEnoughData {
                missing: n - self.remaining(),
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Look at the next `n` bytes without consuming them
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        Some(&self.buf[self.pos..self.pos + n])
    }

    /// Borrow an arbitrary absolute span of the underlying buffer
    ///
    /// Used by checksum layers to hash a span that was consumed by inner
    /// layers. The span must not extend past the underlying buffer.
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a [u8]> {
        if start > end || end > self.buf.len() {
            return None;
        }
        Some(&self.buf[start..end])
    }

    /// Move the position back (or forward) to a previously recorded offset
    pub fn rewind_to(&mut self, pos: usize) {
        debug_assert!(pos <= self.limit);
        self.pos = pos;
    }

    /// Narrow the budget to the next `n` bytes; returns the saved limit
    pub fn push_limit(&mut self, n: usize) -> FrameResult<usize> {
        if self.remaining() < n {
            return Err(FrameError::NotEnoughData {
                missing: n - self.remaining(),
                available: self.remaining(),
            });
        }
        let saved = self.limit;
        self.limit = self.pos + n;
        Ok(saved)
    }

    /// Restore a limit previously returned by [`push_limit`](Self::push_limit)
    pub fn pop_limit(&mut self, saved: usize) {
        debug_assert!(saved >= self.limit);
        self.limit = saved;
    }

    /// Skip any unread bytes up to the current limit; returns the count skipped
    pub fn skip_to_limit(&mut self) -> usize {
        let skipped = self.limit - self.pos;
        self.pos = self.limit;
        skipped
    }
}

/// Output destination for frame writes
///
/// Random-access destinations let a layer write inner content first, then
/// go back and fill in its own size/checksum field in a single pass.
/// Sequential destinations cannot look back; layers write a placeholder and
/// the caller runs the `update` pass afterwards.
pub trait WriteBuf {
    /// Append bytes at the current position
    fn write_bytes(&mut self, bytes: &[u8]) -> FrameResult<()>;

    /// Number of bytes written so far
    fn pos(&self) -> usize;

    /// Whether `patch` and `written` are usable on this destination
    fn is_random_access(&self) -> bool;

    /// Overwrite previously written bytes at absolute offset `at`
    fn patch(&mut self, at: usize, bytes: &[u8]) -> FrameResult<()>;

    /// Read back the bytes written since absolute offset `from`
    ///
    /// Returns `None` on sequential destinations.
    fn written(&self, from: usize) -> Option<&[u8]>;
}

/// Random-access writer over a caller-provided slice
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes still available in the destination
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl WriteBuf for SliceWriter<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> FrameResult<()> {
        if bytes.len() > self.remaining() {
            return Err(FrameError::BufferOverflow {
                need: bytes.len() - self.remaining(),
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn is_random_access(&self) -> bool {
        true
    }

    fn patch(&mut self, at: usize, bytes: &[u8]) -> FrameResult<()> {
        if at + bytes.len() > self.pos {
            return Err(FrameError::malformed(at, "patch outside written span"));
        }
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn written(&self, from: usize) -> Option<&[u8]> {
        if from > self.pos {
            return None;
        }
        Some(&self.buf[from..self.pos])
    }
}

/// Growable random-access destination
impl WriteBuf for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> FrameResult<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn pos(&self) -> usize {
        self.len()
    }

    fn is_random_access(&self) -> bool {
        true
    }

    fn patch(&mut self, at: usize, bytes: &[u8]) -> FrameResult<()> {
        if at + bytes.len() > self.len() {
            return Err(FrameError::malformed(at, "patch outside written span"));
        }
        self[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn written(&self, from: usize) -> Option<&[u8]> {
        if from > self.len() {
            return None;
        }
        Some(&self[from..])
    }
}

/// Sequential, output-only destination over any [`std::io::Write`]
///
/// Cannot look back, so writes through it may finish with `UpdateRequired`
/// and need a follow-up `update` pass over the produced bytes.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: W,
    pos: usize,
}

impl<W: std::io::Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: std::io::Write> WriteBuf for IoWriter<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> FrameResult<()> {
        self.inner.write_all(bytes).map_err(|e| FrameError::Io {
            context: e.to_string(),
        })?;
        self.pos += bytes.len();
        Ok(())
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn is_random_access(&self) -> bool {
        false
    }

    fn patch(&mut self, at: usize, _bytes: &[u8]) -> FrameResult<()> {
        Err(FrameError::malformed(at, "patch on sequential sink"))
    }

    fn written(&self, _from: usize) -> Option<&[u8]> {
        None
    }
}

/// Random-access cursor for the update (finalization) pass
///
/// Walks a fully written frame, re-deriving placeholder field values now
/// that the complete serialized length and content are known. Shares the
/// budget-narrowing discipline of [`ReadCursor`].
#[derive(Debug)]
pub struct UpdateCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
    limit: usize,
}

impl<'a> UpdateCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        let limit = buf.len();
        Self { buf, pos: 0, limit }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// Step over `n` bytes that need no fix-up
    pub fn advance(&mut self, n: usize) -> FrameResult<()> {
        if self.remaining() < n {
            return Err(FrameError::malformed(
                self.pos,
                "frame shorter than its layer composition",
            ));
        }
        self.pos += n;
        Ok(())
    }

    /// Borrow an absolute span for checksum computation
    pub fn slice(&self, start: usize, end: usize) -> Option<&[u8]> {
        if start > end || end > self.buf.len() {
            return None;
        }
        Some(&self.buf[start..end])
    }

    /// Overwrite bytes at absolute offset `at`
    pub fn patch(&mut self, at: usize, bytes: &[u8]) -> FrameResult<()> {
        if at + bytes.len() > self.buf.len() {
            return Err(FrameError::malformed(at, "patch outside frame"));
        }
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Narrow the span to the next `n` bytes; returns the saved limit
    pub fn push_limit(&mut self, n: usize) -> FrameResult<usize> {
        if self.remaining() < n {
            return Err(FrameError::malformed(
                self.pos,
                "frame shorter than declared layer span",
            ));
        }
        let saved = self.limit;
        self.limit = self.pos + n;
        Ok(saved)
    }

    pub fn pop_limit(&mut self, saved: usize) {
        debug_assert!(saved >= self.limit);
        self.limit = saved;
    }

    pub fn skip_to_limit(&mut self) {
        self.pos = self.limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_cursor_tracks_budget() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cur = ReadCursor::new(&data);
        assert_eq!(cur.take(2).unwrap(), &[1, 2]);

        let saved = cur.push_limit(2).unwrap();
        assert_eq!(cur.remaining(), 2);
        assert_eq!(cur.take(1).unwrap(), &[3]);
        assert_eq!(cur.skip_to_limit(), 1);
        cur.pop_limit(saved);

        assert_eq!(cur.remaining(), 1);
        assert_eq!(cur.take(1).unwrap(), &[5]);
    }

    #[test]
    fn read_cursor_reports_shortfall() {
        let data = [1u8, 2];
        let mut cur = ReadCursor::new(&data);
        let err = cur.take(5).unwrap_err();
        assert_eq!(
            err,
            FrameError::NotEnoughData {
                missing: 3,
                available: 2
            }
        );
        // Position is untouched by a failed take.
        assert_eq!(cur.pos(), 0);
    }

    #[test]
    fn read_cursor_rewind_retries_span() {
        let data = [9u8, 8, 7];
        let mut cur = ReadCursor::new(&data);
        let mark = cur.pos();
        assert_eq!(cur.take(2).unwrap(), &[9, 8]);
        cur.rewind_to(mark);
        assert_eq!(cur.take(2).unwrap(), &[9, 8]);
    }

    #[test]
    fn slice_writer_overflow() {
        let mut buf = [0u8; 3];
        let mut out = SliceWriter::new(&mut buf);
        out.write_bytes(&[1, 2]).unwrap();
        let err = out.write_bytes(&[3, 4]).unwrap_err();
        assert_eq!(err, FrameError::BufferOverflow { need: 1 });
    }

    #[test]
    fn slice_writer_patch_and_readback() {
        let mut buf = [0u8; 4];
        let mut out = SliceWriter::new(&mut buf);
        out.write_bytes(&[0, 0, 3, 4]).unwrap();
        out.patch(0, &[1, 2]).unwrap();
        assert_eq!(out.written(0).unwrap(), &[1, 2, 3, 4]);
        assert!(out.patch(3, &[9, 9]).is_err());
    }

    #[test]
    fn vec_writer_is_random_access() {
        let mut out = Vec::new();
        out.write_bytes(&[1, 2, 3]).unwrap();
        assert!(out.is_random_access());
        out.patch(1, &[9]).unwrap();
        assert_eq!(out, vec![1, 9, 3]);
    }

    #[test]
    fn io_writer_is_sequential() {
        let mut sink = Vec::new();
        let mut out = IoWriter::new(&mut sink);
        out.write_bytes(&[5, 6]).unwrap();
        assert!(!out.is_random_access());
        assert!(out.written(0).is_none());
        assert!(out.patch(0, &[0]).is_err());
        assert_eq!(out.pos(), 2);
        assert_eq!(sink, vec![5, 6]);
    }

    #[test]
    fn update_cursor_patches_in_place() {
        let mut buf = [0u8, 1, 2, 3];
        let mut cur = UpdateCursor::new(&mut buf);
        cur.advance(1).unwrap();
        cur.patch(1, &[9]).unwrap();
        assert_eq!(cur.slice(0, 4).unwrap(), &[0, 9, 2, 3]);
        assert!(cur.advance(4).is_err());
    }
}
