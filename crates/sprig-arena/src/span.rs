//! Allocation handles.
//!
//! A [`Span`] locates bytes inside a [`BumpArena`](crate::BumpArena) or
//! [`StaticRegion`](crate::StaticRegion). A [`ValueSpan`] locates bytes in
//! the shared [`ValueStack`](crate::ValueStack) and records which frame
//! allocated them. Both are plain `Copy` values; resolving them to bytes
//! always goes back through the owning region, which validates them.

use std::fmt;
use std::ops::Range;

use sprig_core::{FrameId, RegionId};

/// Handle to a bump allocation.
///
/// The `epoch` is the owning arena's reset count at allocation time, which
/// gives an O(1) staleness check: once the arena is reset the span no
/// longer resolves, even though a later allocation may reuse its offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub(crate) region: RegionId,
    pub(crate) epoch: u32,
    pub(crate) offset: u32,
    pub(crate) len: u32,
}

impl Span {
    pub(crate) fn new(region: RegionId, epoch: u32, offset: u32, len: u32) -> Self {
        Self {
            region,
            epoch,
            offset,
            len,
        }
    }

    /// The region that produced this span.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// The arena epoch this span belongs to.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Byte offset from the start of the region.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset() + self.len()
    }

    /// Byte range within the region.
    pub fn range(&self) -> Range<usize> {
        self.offset()..self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Span(region={}, epoch={}, off={}, len={})",
            self.region, self.epoch, self.offset, self.len
        )
    }
}

/// Handle to an allocation in the shared value stack.
///
/// `frame` is the id of the frame that made the allocation. The frame
/// stack only resolves a value span while that frame is still on the live
/// path, so spans made inside an abandoned branch cannot be read from its
/// siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueSpan {
    pub(crate) region: RegionId,
    pub(crate) frame: FrameId,
    pub(crate) offset: u32,
    pub(crate) len: u32,
}

impl ValueSpan {
    pub(crate) fn new(region: RegionId, frame: FrameId, offset: u32, len: u32) -> Self {
        Self {
            region,
            frame,
            offset,
            len,
        }
    }

    /// The value stack that produced this span.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// The frame that allocated this span.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Byte offset from the start of the value stack.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset() + self.len()
    }

    /// Byte range within the value stack.
    pub fn range(&self) -> Range<usize> {
        self.offset()..self.end()
    }
}

impl fmt::Display for ValueSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValueSpan(frame={}, off={}, len={})",
            self.frame, self.offset, self.len
        )
    }
}
