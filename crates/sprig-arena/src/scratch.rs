//! Shared value stack for snapshot-able simulation state.
//!
//! [`ValueStack`] is one fixed buffer shared by every frame of a stack.
//! It keeps no cursor of its own: each frame owns a high-water mark into
//! it, a child frame starts at its parent's mark, and allocations simply
//! advance the current frame's mark. The occupied prefix `[0, mark)` is
//! what savepoints copy out and restores copy back.

use sprig_core::{FrameId, RegionId};

use crate::error::ArenaError;
use crate::hash::fnv1a;
use crate::raw::{align_up, check_align, AlignedBytes};
use crate::span::ValueSpan;

/// Fixed-size, region-aligned byte buffer partitioned by nesting depth.
pub struct ValueStack {
    id: RegionId,
    data: AlignedBytes,
}

impl ValueStack {
    /// Create a value stack of `capacity` bytes, zero-initialised.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            id: RegionId::next(),
            data: AlignedBytes::zeroed(capacity)?,
        })
    }

    /// Allocate `size` bytes aligned to `align`, starting at or after
    /// `mark`, on behalf of frame `owner`.
    ///
    /// Returns the span and the new mark. The allocated bytes are zeroed,
    /// so a frame never observes what an abandoned sibling left behind
    /// above the shared prefix. Nothing is modified on error.
    pub fn alloc(
        &mut self,
        owner: FrameId,
        mark: usize,
        size: usize,
        align: usize,
    ) -> Result<(ValueSpan, usize), ArenaError> {
        check_align(align)?;
        let capacity = self.data.len();
        let overflow = ArenaError::CapacityExceeded {
            requested: size,
            remaining: capacity.saturating_sub(mark),
            capacity,
        };
        let start = align_up(mark, align).ok_or_else(|| overflow.clone())?;
        let end = start.checked_add(size).ok_or_else(|| overflow.clone())?;
        if end > capacity {
            return Err(overflow);
        }
        self.data.as_bytes_mut()[start..end].fill(0);
        Ok((
            ValueSpan::new(self.id, owner, start as u32, size as u32),
            end,
        ))
    }

    /// Resolve a span to its bytes, refusing anything past `limit`.
    pub fn bytes(&self, span: &ValueSpan, limit: usize) -> Result<&[u8], ArenaError> {
        self.check(span, limit)?;
        Ok(&self.data.as_bytes()[span.range()])
    }

    /// Resolve a span to its bytes mutably, refusing anything past `limit`.
    pub fn bytes_mut(&mut self, span: &ValueSpan, limit: usize) -> Result<&mut [u8], ArenaError> {
        self.check(span, limit)?;
        Ok(&mut self.data.as_bytes_mut()[span.range()])
    }

    fn check(&self, span: &ValueSpan, limit: usize) -> Result<(), ArenaError> {
        if span.region != self.id {
            return Err(ArenaError::ForeignSpan {
                expected: self.id,
                found: span.region,
            });
        }
        let limit = limit.min(self.data.len());
        if span.end() > limit {
            return Err(ArenaError::OutOfBounds {
                end: span.end(),
                limit,
            });
        }
        Ok(())
    }

    /// The occupied prefix `[0, len)`.
    pub fn prefix(&self, len: usize) -> Result<&[u8], ArenaError> {
        self.data
            .as_bytes()
            .get(..len)
            .ok_or(ArenaError::OutOfBounds {
                end: len,
                limit: self.data.len(),
            })
    }

    /// The occupied prefix `[0, len)`, mutably.
    pub fn prefix_mut(&mut self, len: usize) -> Result<&mut [u8], ArenaError> {
        let capacity = self.data.len();
        self.data
            .as_bytes_mut()
            .get_mut(..len)
            .ok_or(ArenaError::OutOfBounds {
                end: len,
                limit: capacity,
            })
    }

    /// FNV-1a digest of the prefix `[0, len)`.
    pub fn digest(&self, len: usize) -> Result<u64, ArenaError> {
        self.prefix(len).map(fnv1a)
    }

    /// This value stack's region id.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.memory_bytes()
    }
}
