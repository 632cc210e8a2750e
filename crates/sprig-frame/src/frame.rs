//! One nesting level of the frame stack.
//!
//! A [`Frame`] is a reusable slot: its bump arena is constructed the first
//! time the slot is entered and then reset (not rebuilt) on every later
//! entry. Exiting only clears the active flag; reclaiming the arena is
//! deferred to the next `enter`, which is guaranteed to come after the
//! previous occupant has exited because depth is strictly nested.

use sprig_arena::{BumpArena, Span};
use sprig_core::{BranchId, FrameId, RegionId};

use crate::branch::BranchList;
use crate::error::{ProtocolViolation, StackError};

/// State of one depth slot.
pub(crate) struct Frame {
    depth: usize,
    /// Constructed lazily on first entry.
    arena: Option<BumpArena>,
    active: bool,
    /// A savepoint has been taken since the last entry.
    pub(crate) saved: bool,
    id: FrameId,
    /// Value-stack offset at entry (the parent's mark at that moment).
    value_base: usize,
    /// Value-stack high-water mark.
    pub(crate) value_mark: usize,
    /// Snapshot buffer in the static region, kept across entries.
    pub(crate) snapshot: Option<Span>,
    branches: Option<BranchList>,
}

impl Frame {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            depth,
            arena: None,
            active: false,
            saved: false,
            id: FrameId::NONE,
            value_base: 0,
            value_mark: 0,
            snapshot: None,
            branches: None,
        }
    }

    /// Make this slot live under `id`, starting its value-stack range at
    /// `value_base`.
    ///
    /// Returns `true` if this call constructed the slot's arena.
    pub(crate) fn enter(
        &mut self,
        id: FrameId,
        value_base: usize,
        arena_capacity: usize,
    ) -> Result<bool, StackError> {
        if self.active {
            return Err(ProtocolViolation::FrameAlreadyActive { depth: self.depth }.into());
        }
        let constructed = self.arena.is_none();
        if constructed {
            self.arena = Some(BumpArena::new(arena_capacity)?);
        }
        if let Some(arena) = &mut self.arena {
            arena.reset();
        }

        self.id = id;
        self.active = true;
        self.saved = false;
        self.branches = None;
        self.value_base = value_base;
        self.value_mark = value_base;
        Ok(constructed)
    }

    pub(crate) fn exit(&mut self) -> Result<(), StackError> {
        self.require_active()?;
        self.active = false;
        Ok(())
    }

    pub(crate) fn require_active(&self) -> Result<(), StackError> {
        if self.active {
            Ok(())
        } else {
            Err(ProtocolViolation::FrameNotActive { depth: self.depth }.into())
        }
    }

    fn live_arena(&self) -> Result<&BumpArena, StackError> {
        self.require_active()?;
        self.arena
            .as_ref()
            .ok_or_else(|| ProtocolViolation::FrameNotActive { depth: self.depth }.into())
    }

    fn live_arena_mut(&mut self) -> Result<&mut BumpArena, StackError> {
        self.require_active()?;
        let depth = self.depth;
        self.arena
            .as_mut()
            .ok_or_else(|| ProtocolViolation::FrameNotActive { depth }.into())
    }

    pub(crate) fn alloc_local(&mut self, size: usize, align: usize) -> Result<Span, StackError> {
        Ok(self.live_arena_mut()?.alloc(size, align)?)
    }

    pub(crate) fn local(&self, span: &Span) -> Result<&[u8], StackError> {
        Ok(self.live_arena()?.bytes(span)?)
    }

    pub(crate) fn local_mut(&mut self, span: &Span) -> Result<&mut [u8], StackError> {
        Ok(self.live_arena_mut()?.bytes_mut(span)?)
    }

    pub(crate) fn owns(&self, span: &Span) -> bool {
        self.live_arena()
            .map(|arena| arena.contains(span))
            .unwrap_or(false)
    }

    /// Attach a branch set. The frame must be live and have no set yet.
    pub(crate) fn register_branches(&mut self, ids: &[BranchId]) -> Result<(), StackError> {
        if self.branches.is_some() {
            return Err(ProtocolViolation::BranchesRegistered { frame: self.id }.into());
        }
        if ids.iter().any(|id| id.is_none()) {
            return Err(ProtocolViolation::ReservedBranchId.into());
        }
        let list = BranchList::store(self.live_arena_mut()?, ids)?;
        self.branches = Some(list);
        Ok(())
    }

    /// Consume the next branch id from this frame's set.
    pub(crate) fn next_branch_id(&mut self) -> Result<Option<BranchId>, StackError> {
        self.require_active()?;
        let frame = self.id;
        let list = self
            .branches
            .as_mut()
            .ok_or(ProtocolViolation::NoBranchesRegistered { frame })?;
        let arena = self
            .arena
            .as_ref()
            .ok_or(ProtocolViolation::FrameNotActive { depth: self.depth })?;
        Ok(list.next(arena)?)
    }

    /// Drop a branch set that was registered but never descended into.
    pub(crate) fn abandon_branches(&mut self) {
        self.branches = None;
    }

    pub(crate) fn id(&self) -> FrameId {
        self.id
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Region id of the slot's arena, once constructed.
    pub(crate) fn arena_id(&self) -> Option<RegionId> {
        self.arena.as_ref().map(BumpArena::id)
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.arena.is_some()
    }

    pub(crate) fn has_branches(&self) -> bool {
        self.branches.is_some()
    }

    pub(crate) fn value_base(&self) -> usize {
        self.value_base
    }

    pub(crate) fn branch_counts(&self) -> (usize, usize) {
        self.branches
            .as_ref()
            .map(|b| (b.len(), b.remaining()))
            .unwrap_or((0, 0))
    }

    pub(crate) fn local_used(&self) -> usize {
        self.arena.as_ref().map(BumpArena::used).unwrap_or(0)
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        self.arena.as_ref().map(BumpArena::memory_bytes).unwrap_or(0)
    }
}
