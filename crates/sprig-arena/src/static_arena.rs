//! Stack-lifetime region for data that outlives every frame.
//!
//! [`StaticRegion`] is a [`BumpArena`] with no way to reset it. Snapshot
//! buffers for savepoints are carved out of it, as is any caller data that
//! must survive frame exits.

use crate::bump::BumpArena;
use crate::error::ArenaError;
use crate::raw::REGION_ALIGN;
use crate::span::Span;

/// Bump region that is never reset.
///
/// Spans from a static region stay valid until the region is dropped.
pub struct StaticRegion {
    arena: BumpArena,
}

impl StaticRegion {
    /// Create a static region of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            arena: BumpArena::new(capacity)?,
        })
    }

    /// Allocate `size` zeroed bytes aligned to `align`.
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<Span, ArenaError> {
        self.arena.alloc(size, align)
    }

    /// Allocate `size` zeroed bytes at the maximum alignment.
    pub fn alloc_default(&mut self, size: usize) -> Result<Span, ArenaError> {
        self.arena.alloc(size, REGION_ALIGN)
    }

    /// Resolve a span to its bytes.
    pub fn bytes(&self, span: &Span) -> Result<&[u8], ArenaError> {
        self.arena.bytes(span)
    }

    /// Resolve a span to its bytes, mutably.
    pub fn bytes_mut(&mut self, span: &Span) -> Result<&mut [u8], ArenaError> {
        self.arena.bytes_mut(span)
    }

    /// Whether `span` was allocated from this region.
    pub fn contains(&self, span: &Span) -> bool {
        self.arena.contains(span)
    }

    /// Bytes allocated so far (including padding).
    pub fn used(&self) -> usize {
        self.arena.used()
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.arena.remaining()
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.arena.memory_bytes()
    }
}
