//! Per-frame branch enumerator.
//!
//! The id list lives in the owning frame's bump arena, so registering a
//! branch set costs no heap allocation and the list is reclaimed together
//! with the rest of the frame's private memory on the next entry.

use std::mem::{align_of, size_of};

use sprig_arena::{cast_slice, cast_slice_mut, ArenaError, BumpArena, Span};
use sprig_core::BranchId;

/// Ordered branch ids plus a cursor to the next one to hand out.
///
/// Immutable once stored: ids can only be consumed, never added.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BranchList {
    span: Span,
    len: usize,
    next: usize,
}

impl BranchList {
    /// Copy `ids` into `arena` and return an enumerator over them.
    pub(crate) fn store(arena: &mut BumpArena, ids: &[BranchId]) -> Result<Self, ArenaError> {
        let size = ids
            .len()
            .checked_mul(size_of::<u64>())
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                remaining: arena.remaining(),
                capacity: arena.capacity(),
            })?;
        let span = arena.alloc(size, align_of::<u64>())?;
        let slots: &mut [u64] = cast_slice_mut(arena.bytes_mut(&span)?)?;
        for (slot, id) in slots.iter_mut().zip(ids) {
            *slot = id.0;
        }
        Ok(Self {
            span,
            len: ids.len(),
            next: 0,
        })
    }

    /// Hand out the next id, or `None` once every id has been consumed.
    pub(crate) fn next(&mut self, arena: &BumpArena) -> Result<Option<BranchId>, ArenaError> {
        if self.next >= self.len {
            return Ok(None);
        }
        let slots: &[u64] = cast_slice(arena.bytes(&self.span)?)?;
        let id = BranchId(slots[self.next]);
        self.next += 1;
        Ok(Some(id))
    }

    /// Total number of ids in the set.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Ids not yet handed out.
    pub(crate) fn remaining(&self) -> usize {
        self.len - self.next
    }
}
