//! Fixed-capacity bump allocator.
//!
//! A [`BumpArena`] is a single pre-reserved byte region with a cursor that
//! advances on each allocation. It never grows: running out of room is a
//! [`ArenaError::CapacityExceeded`]. [`BumpArena::reset`] rewinds the
//! cursor in O(1) and bumps the epoch, invalidating every span handed out
//! so far.

use sprig_core::RegionId;

use crate::error::ArenaError;
use crate::raw::{align_up, check_align, AlignedBytes};
use crate::span::Span;

/// A single contiguous region with bump allocation.
pub struct BumpArena {
    id: RegionId,
    /// Backing storage, reserved to full capacity at creation.
    data: AlignedBytes,
    /// Next free byte.
    cursor: usize,
    /// Incremented on every reset.
    epoch: u32,
}

impl BumpArena {
    /// Create an arena of `capacity` bytes.
    ///
    /// The whole region is reserved and zeroed up front.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            id: RegionId::next(),
            data: AlignedBytes::zeroed(capacity)?,
            cursor: 0,
            epoch: 0,
        })
    }

    /// Bump-allocate `size` bytes aligned to `align`.
    ///
    /// The returned bytes are zeroed (they may hold data from before the
    /// last reset otherwise). `align` must be a power of two no larger than
    /// [`REGION_ALIGN`](crate::REGION_ALIGN).
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<Span, ArenaError> {
        check_align(align)?;
        let capacity = self.data.len();
        let overflow = ArenaError::CapacityExceeded {
            requested: size,
            remaining: capacity - self.cursor,
            capacity,
        };
        let start = align_up(self.cursor, align).ok_or_else(|| overflow.clone())?;
        let end = start.checked_add(size).ok_or_else(|| overflow.clone())?;
        if end > capacity {
            return Err(overflow);
        }
        self.data.as_bytes_mut()[start..end].fill(0);
        self.cursor = end;
        // capacity <= u32::MAX is enforced by AlignedBytes::zeroed.
        Ok(Span::new(self.id, self.epoch, start as u32, size as u32))
    }

    /// Rewind the cursor to zero.
    ///
    /// Every span previously returned by this arena becomes stale. The
    /// backing memory is kept and reused by later allocations.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Whether `span` was allocated by this arena since its last reset.
    ///
    /// Intended for debug assertions, not for control flow.
    pub fn contains(&self, span: &Span) -> bool {
        self.check(span).is_ok()
    }

    /// Resolve a span to its bytes.
    pub fn bytes(&self, span: &Span) -> Result<&[u8], ArenaError> {
        self.check(span)?;
        Ok(&self.data.as_bytes()[span.range()])
    }

    /// Resolve a span to its bytes, mutably.
    pub fn bytes_mut(&mut self, span: &Span) -> Result<&mut [u8], ArenaError> {
        self.check(span)?;
        Ok(&mut self.data.as_bytes_mut()[span.range()])
    }

    fn check(&self, span: &Span) -> Result<(), ArenaError> {
        if span.region != self.id {
            return Err(ArenaError::ForeignSpan {
                expected: self.id,
                found: span.region,
            });
        }
        if span.epoch != self.epoch {
            return Err(ArenaError::StaleSpan {
                span_epoch: span.epoch,
                current_epoch: self.epoch,
            });
        }
        if span.end() > self.cursor {
            return Err(ArenaError::OutOfBounds {
                end: span.end(),
                limit: self.cursor,
            });
        }
        Ok(())
    }

    /// This arena's region id.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Number of resets performed so far.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Bytes allocated since the last reset (including padding).
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.memory_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_bytes() {
        let mut arena = BumpArena::new(256).unwrap();
        let span = arena.alloc(10, 1).unwrap();
        assert_eq!(span.offset(), 0);
        assert_eq!(span.len(), 10);
        assert!(arena.bytes(&span).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn sequential_allocs_respect_alignment() {
        let mut arena = BumpArena::new(256).unwrap();
        let a = arena.alloc(3, 1).unwrap();
        let b = arena.alloc(8, 8).unwrap();
        let c = arena.alloc(1, 64).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 8);
        assert_eq!(c.offset(), 64);
        assert_eq!(arena.used(), 65);
    }

    #[test]
    fn alloc_fails_when_full() {
        let mut arena = BumpArena::new(100).unwrap();
        arena.alloc(100, 1).unwrap();
        let err = arena.alloc(1, 1).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                requested: 1,
                remaining: 0,
                capacity: 100
            }
        );
        assert_eq!(arena.used(), 100);
    }

    #[test]
    fn padding_counts_against_capacity() {
        let mut arena = BumpArena::new(16).unwrap();
        arena.alloc(1, 1).unwrap();
        assert!(arena.alloc(16, 8).is_err());
        assert!(arena.alloc(8, 8).is_ok());
    }

    #[test]
    fn oversized_alignment_rejected() {
        let mut arena = BumpArena::new(256).unwrap();
        assert_eq!(
            arena.alloc(8, 128),
            Err(ArenaError::InvalidAlignment { align: 128 })
        );
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn reset_reuses_offsets_and_stales_spans() {
        let mut arena = BumpArena::new(64).unwrap();
        let old = arena.alloc(8, 8).unwrap();
        arena.bytes_mut(&old).unwrap().fill(0xAB);
        assert!(arena.contains(&old));

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert!(!arena.contains(&old));
        assert_eq!(
            arena.bytes(&old),
            Err(ArenaError::StaleSpan {
                span_epoch: 0,
                current_epoch: 1
            })
        );

        let new = arena.alloc(8, 8).unwrap();
        assert_eq!(new.offset(), old.offset());
        assert_ne!(new, old);
        // Reused memory is handed out zeroed, not with the old contents.
        assert!(arena.bytes(&new).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn foreign_span_rejected() {
        let mut a = BumpArena::new(64).unwrap();
        let b = BumpArena::new(64).unwrap();
        let span = a.alloc(4, 4).unwrap();
        assert!(!b.contains(&span));
        assert!(matches!(
            b.bytes(&span),
            Err(ArenaError::ForeignSpan { .. })
        ));
    }

    #[test]
    fn zero_sized_alloc_is_valid() {
        let mut arena = BumpArena::new(8).unwrap();
        let span = arena.alloc(0, 1).unwrap();
        assert!(span.is_empty());
        assert!(arena.contains(&span));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn region_too_large_is_reported() {
        let requested = u32::MAX as usize + 1;
        assert_eq!(
            BumpArena::new(requested).err(),
            Some(ArenaError::RegionTooLarge { requested })
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allocations_are_disjoint_aligned_and_in_bounds(
                reqs in proptest::collection::vec((0usize..48, 0u32..7), 1..40),
            ) {
                let mut arena = BumpArena::new(512).unwrap();
                let mut spans = Vec::new();
                for (size, align_pow) in reqs {
                    let align = 1usize << align_pow;
                    if let Ok(span) = arena.alloc(size, align) {
                        prop_assert_eq!(span.offset() % align, 0);
                        prop_assert!(span.end() <= arena.capacity());
                        spans.push(span);
                    }
                }
                for (i, a) in spans.iter().enumerate() {
                    for b in &spans[i + 1..] {
                        prop_assert!(a.end() <= b.offset() || a.is_empty() || b.is_empty());
                    }
                }
                prop_assert!(arena.used() <= arena.capacity());
            }

            #[test]
            fn reset_replays_identical_offsets(
                sizes in proptest::collection::vec(1usize..32, 1..20),
            ) {
                let mut arena = BumpArena::new(1024).unwrap();
                let first: Vec<usize> = sizes
                    .iter()
                    .map(|&n| arena.alloc(n, 8).unwrap().offset())
                    .collect();
                arena.reset();
                let second: Vec<usize> = sizes
                    .iter()
                    .map(|&n| arena.alloc(n, 8).unwrap().offset())
                    .collect();
                prop_assert_eq!(first, second);
            }
        }
    }
}
