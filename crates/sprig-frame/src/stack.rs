//! The frame stack: nesting discipline, allocation lifetimes, and the
//! branch checkpoint protocol.
//!
//! A [`FrameStack`] owns:
//!
//! ```text
//! static_region: StaticRegion   ←─── never reset; snapshot buffers live here
//! frames:        Vec<Frame>     ←─── max_depth slots, arena per slot (lazy)
//! values:        ValueStack     ←─── shared, partitioned by depth
//! ```
//!
//! The lifecycle of a branch set is:
//! 1. `branch(ids)`: register ids on the current frame, savepoint if
//!    there is more than one, descend into a child for the first id
//! 2. the driver simulates that branch
//! 3. `next_branch()`: exit the child, restore the parent's savepoint,
//!    descend into a fresh child for the next id
//! 4. once `next_branch()` returns `None`, the driver calls `exit()`
//!
//! Every operation checks its preconditions before touching any state, so
//! an `Err` leaves the stack exactly as it was.

use bytemuck::Pod;
use smallvec::SmallVec;
use sprig_arena::{cast_slice, cast_slice_mut, ArenaError, Span, StaticRegion, ValueSpan, ValueStack};
use sprig_core::{BranchId, FrameId};
use tracing::{debug, trace, warn};

use crate::config::StackConfig;
use crate::error::{ProtocolViolation, StackError};
use crate::frame::Frame;
use crate::metrics::StackMetrics;

/// Read-only view of one frame slot, for inspection and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Slot index.
    pub depth: usize,
    /// Id of the most recent entry into this slot, or `FrameId::NONE`.
    pub id: FrameId,
    /// Whether the slot is on the live path.
    pub active: bool,
    /// Whether the slot's arena has been constructed.
    pub constructed: bool,
    /// Value-stack offset at entry.
    pub value_base: usize,
    /// Value-stack high-water mark.
    pub value_mark: usize,
    /// Whether a savepoint has been taken since entry.
    pub saved: bool,
    /// Size of the registered branch set (0 if none).
    pub branches_total: usize,
    /// Ids of the branch set not yet handed out.
    pub branches_remaining: usize,
    /// Bytes used in the slot's private arena.
    pub local_used: usize,
}

/// Fixed-depth stack of frames over a shared, snapshot-able value stack.
///
/// Three allocation lifetimes are available:
///
/// - **static** ([`alloc_static`](Self::alloc_static)): lives as long as
///   the stack.
/// - **local** ([`alloc_local`](Self::alloc_local)): private to the
///   current frame, reclaimed the next time its slot is entered, invisible
///   to savepoint/restore.
/// - **scratch** ([`alloc_scratch`](Self::alloc_scratch)): in the shared
///   value stack, inherited by child frames and rewound by
///   [`restore`](Self::restore), so sibling branches all start from the
///   same bytes.
pub struct FrameStack {
    config: StackConfig,
    static_region: StaticRegion,
    frames: Vec<Frame>,
    values: ValueStack,
    depth: usize,
    next_frame_id: FrameId,
    metrics: StackMetrics,
}

/// Log capacity failures on their way out.
fn note_capacity(err: StackError) -> StackError {
    if err.is_capacity() {
        warn!(error = %err, "frame stack capacity exhausted");
    }
    err
}

impl FrameStack {
    /// Create a stack and enter the root frame (depth 0, id 1).
    ///
    /// Reserves the static region and the value stack up front; frame
    /// arenas are constructed as their slots are first entered.
    pub fn new(config: StackConfig) -> Result<Self, StackError> {
        config.validate()?;
        let static_region = StaticRegion::new(config.static_capacity).map_err(note_capacity_arena)?;
        let values = ValueStack::new(config.scratch_capacity).map_err(note_capacity_arena)?;
        let frames = (0..config.max_depth).map(Frame::new).collect();

        let mut stack = Self {
            config,
            static_region,
            frames,
            values,
            depth: 0,
            next_frame_id: FrameId::ROOT,
            metrics: StackMetrics::default(),
        };
        stack.enter_slot(0, 0)?;
        Ok(stack)
    }

    /// Create a stack with [`StackConfig::default`].
    pub fn with_defaults() -> Result<Self, StackError> {
        Self::new(StackConfig::default())
    }

    /// Release every region.
    ///
    /// Equivalent to dropping the stack; logs the final metrics first.
    pub fn destroy(self) {
        debug!(
            depth = self.depth,
            frames_entered = self.metrics.frames_entered,
            savepoints = self.metrics.savepoints,
            restores = self.metrics.restores,
            memory_bytes = self.memory_bytes(),
            "destroy frame stack"
        );
    }

    // ── allocation ─────────────────────────────────────────────────

    /// Allocate `size` zeroed bytes that live as long as the stack.
    pub fn alloc_static(&mut self, size: usize, align: usize) -> Result<Span, StackError> {
        self.static_region
            .alloc(size, align)
            .map_err(note_capacity_arena)
    }

    /// Allocate `size` zeroed static bytes at the maximum alignment.
    pub fn alloc_static_default(&mut self, size: usize) -> Result<Span, StackError> {
        self.static_region
            .alloc_default(size)
            .map_err(note_capacity_arena)
    }

    /// Allocate `size` zeroed bytes in the shared value stack on behalf of
    /// the current frame, advancing its high-water mark.
    ///
    /// Rejected while the current frame holds a savepoint or has
    /// registered a branch set: its state has already been handed to its
    /// children as their starting point.
    pub fn alloc_scratch(&mut self, size: usize, align: usize) -> Result<ValueSpan, StackError> {
        let frame = &mut self.frames[self.depth];
        frame.require_active()?;
        if frame.saved {
            return Err(ProtocolViolation::SnapshotTaken { frame: frame.id() }.into());
        }
        if frame.has_branches() {
            return Err(ProtocolViolation::BranchesRegistered { frame: frame.id() }.into());
        }
        let (span, mark) = self
            .values
            .alloc(frame.id(), frame.value_mark, size, align)
            .map_err(note_capacity_arena)?;
        frame.value_mark = mark;
        self.metrics.scratch_high_water = self.metrics.scratch_high_water.max(mark);
        Ok(span)
    }

    /// Allocate room for `count` values of `T` in the value stack.
    pub fn alloc_scratch_slice<T: Pod>(&mut self, count: usize) -> Result<ValueSpan, StackError> {
        let size = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| {
                note_capacity_arena(ArenaError::CapacityExceeded {
                    requested: usize::MAX,
                    remaining: self.scratch_remaining(),
                    capacity: self.values.capacity(),
                })
            })?;
        self.alloc_scratch(size, std::mem::align_of::<T>())
    }

    /// Allocate `size` zeroed bytes in the current frame's private arena.
    pub fn alloc_local(&mut self, size: usize, align: usize) -> Result<Span, StackError> {
        self.frames[self.depth]
            .alloc_local(size, align)
            .map_err(note_capacity)
    }

    /// Whether `span` came from the current frame's private arena since
    /// its last entry.
    ///
    /// Intended for debug assertions in drivers.
    pub fn owns(&self, span: &Span) -> bool {
        self.frames[self.depth].owns(span)
    }

    // ── access ─────────────────────────────────────────────────────

    /// Bytes of a static allocation.
    pub fn static_bytes(&self, span: &Span) -> Result<&[u8], StackError> {
        Ok(self.static_region.bytes(span)?)
    }

    /// Bytes of a static allocation, mutably.
    pub fn static_bytes_mut(&mut self, span: &Span) -> Result<&mut [u8], StackError> {
        Ok(self.static_region.bytes_mut(span)?)
    }

    /// Bytes of a local allocation made by the current frame or any
    /// ancestor on the live path.
    ///
    /// A span stays readable until its slot is next entered; spans from a
    /// slot that has since been exited are rejected.
    pub fn local(&self, span: &Span) -> Result<&[u8], StackError> {
        self.frames[self.local_slot(span)].local(span)
    }

    /// Bytes of a local allocation on the live path, mutably.
    pub fn local_mut(&mut self, span: &Span) -> Result<&mut [u8], StackError> {
        let slot = self.local_slot(span);
        self.frames[slot].local_mut(span)
    }

    /// Slot whose arena produced `span`, or the current slot if none did
    /// (which then reports the span as foreign).
    fn local_slot(&self, span: &Span) -> usize {
        self.frames
            .iter()
            .position(|f| f.arena_id() == Some(span.region()))
            .unwrap_or(self.depth)
    }

    /// Bytes of a value-stack allocation.
    ///
    /// The allocating frame must still be on the live path; spans from
    /// exited frames (including abandoned sibling branches) are rejected.
    pub fn scratch(&self, span: &ValueSpan) -> Result<&[u8], StackError> {
        self.check_value_span(span)?;
        Ok(self.values.bytes(span, self.value_mark())?)
    }

    /// Bytes of a value-stack allocation, mutably.
    pub fn scratch_mut(&mut self, span: &ValueSpan) -> Result<&mut [u8], StackError> {
        self.check_value_span(span)?;
        let limit = self.value_mark();
        Ok(self.values.bytes_mut(span, limit)?)
    }

    /// A value-stack allocation viewed as `[T]`.
    pub fn scratch_as<T: Pod>(&self, span: &ValueSpan) -> Result<&[T], StackError> {
        Ok(cast_slice(self.scratch(span)?)?)
    }

    /// A value-stack allocation viewed as `[T]`, mutably.
    pub fn scratch_as_mut<T: Pod>(&mut self, span: &ValueSpan) -> Result<&mut [T], StackError> {
        Ok(cast_slice_mut(self.scratch_mut(span)?)?)
    }

    fn check_value_span(&self, span: &ValueSpan) -> Result<(), StackError> {
        if span.region() != self.values.id() {
            return Err(ArenaError::ForeignSpan {
                expected: self.values.id(),
                found: span.region(),
            }
            .into());
        }
        let live = self.frames[..=self.depth]
            .iter()
            .any(|f| f.id() == span.frame());
        if !live {
            return Err(ProtocolViolation::StaleValueSpan {
                frame: span.frame(),
            }
            .into());
        }
        Ok(())
    }

    // ── nesting ────────────────────────────────────────────────────

    /// Descend into a new frame one level deeper.
    ///
    /// The new frame's value-stack range starts at the current frame's
    /// mark. Fails with [`StackError::DepthExceeded`] at the last slot.
    /// A frame that has registered a branch set only descends through
    /// [`branch`](Self::branch) and [`next_branch`](Self::next_branch).
    pub fn enter(&mut self) -> Result<FrameId, StackError> {
        self.reject_branch_set()?;
        self.descend()
    }

    fn descend(&mut self) -> Result<FrameId, StackError> {
        let next = self.depth + 1;
        if next >= self.config.max_depth {
            return Err(note_capacity(StackError::DepthExceeded {
                max_depth: self.config.max_depth,
            }));
        }
        let base = self.frames[self.depth].value_mark;
        let id = self.enter_slot(next, base)?;
        self.depth = next;
        Ok(id)
    }

    /// Enter slot `depth` with the next frame id. Does not move `depth`.
    fn enter_slot(&mut self, depth: usize, base: usize) -> Result<FrameId, StackError> {
        let id = self.next_frame_id;
        let following = id
            .successor()
            .ok_or_else(|| note_capacity(StackError::FrameIdsExhausted))?;
        let constructed = self.frames[depth]
            .enter(id, base, self.config.frame_capacity)
            .map_err(note_capacity)?;
        self.next_frame_id = following;

        self.metrics.frames_entered += 1;
        if constructed {
            self.metrics.frame_arenas_constructed += 1;
        }
        self.metrics.deepest = self.metrics.deepest.max(depth);
        debug!(depth, frame = id.0, value_base = base, "enter frame");
        Ok(id)
    }

    /// Leave the current frame and return to its parent.
    ///
    /// The frame's private arena is not reset here; that happens the next
    /// time the slot is entered.
    pub fn exit(&mut self) -> Result<(), StackError> {
        if self.depth == 0 {
            return Err(ProtocolViolation::ExitRoot.into());
        }
        let frame = &mut self.frames[self.depth];
        frame.exit()?;
        debug!(depth = self.depth, frame = frame.id().0, "exit frame");
        self.depth -= 1;
        self.metrics.frames_exited += 1;
        Ok(())
    }

    // ── checkpointing ──────────────────────────────────────────────

    /// Copy the current frame's occupied value-stack prefix aside.
    ///
    /// The snapshot buffer is allocated from the static region the first
    /// time its slot takes a savepoint and reused afterwards. Once taken,
    /// the frame can no longer allocate scratch until it is re-entered.
    pub fn savepoint(&mut self) -> Result<(), StackError> {
        self.reject_branch_set()?;
        let scratch_capacity = self.values.capacity();
        let frame = &mut self.frames[self.depth];
        frame.require_active()?;
        if frame.saved {
            return Err(ProtocolViolation::SnapshotTaken { frame: frame.id() }.into());
        }
        let buffer = match frame.snapshot {
            Some(span) => span,
            None => {
                let span = self
                    .static_region
                    .alloc_default(scratch_capacity)
                    .map_err(note_capacity_arena)?;
                frame.snapshot = Some(span);
                span
            }
        };
        let mark = frame.value_mark;
        let live = self.values.prefix(mark)?;
        self.static_region.bytes_mut(&buffer)?[..mark].copy_from_slice(live);
        frame.saved = true;

        self.metrics.savepoints += 1;
        self.metrics.bytes_snapshotted += mark as u64;
        trace!(depth = self.depth, frame = frame.id().0, bytes = mark, "savepoint");
        Ok(())
    }

    /// Copy the current frame's savepoint back over the value stack.
    ///
    /// The savepoint stays in place, so the frame can be restored more
    /// than once. A frame holding a branch set is restored only by
    /// [`next_branch`](Self::next_branch).
    pub fn restore(&mut self) -> Result<(), StackError> {
        self.reject_branch_set()?;
        self.restore_prefix()
    }

    fn restore_prefix(&mut self) -> Result<(), StackError> {
        let frame = &self.frames[self.depth];
        frame.require_active()?;
        let buffer = match frame.snapshot {
            Some(span) if frame.saved => span,
            _ => return Err(ProtocolViolation::NoSnapshot { frame: frame.id() }.into()),
        };
        let mark = frame.value_mark;
        let saved = &self.static_region.bytes(&buffer)?[..mark];
        self.values.prefix_mut(mark)?.copy_from_slice(saved);

        self.metrics.restores += 1;
        self.metrics.bytes_restored += mark as u64;
        trace!(depth = self.depth, frame = frame.id().0, bytes = mark, "restore");
        Ok(())
    }

    // ── branching ──────────────────────────────────────────────────

    /// Fail if the current frame has registered a branch set.
    fn reject_branch_set(&self) -> Result<(), StackError> {
        let frame = &self.frames[self.depth];
        if frame.has_branches() {
            return Err(ProtocolViolation::BranchesRegistered { frame: frame.id() }.into());
        }
        Ok(())
    }

    /// Register `ids` as the current frame's branch set and descend into
    /// the first branch.
    ///
    /// With more than one id a savepoint is taken first, so every sibling
    /// can later be started from the same state. A single-id set skips it:
    /// nothing will ever need to return to this point. Returns the id of
    /// the branch entered, or `None` for an empty set (no descent).
    ///
    /// After this call the frame accepts only `next_branch()` from its
    /// child and its own `exit()`.
    pub fn branch(&mut self, ids: &[BranchId]) -> Result<Option<BranchId>, StackError> {
        let depth = self.depth;
        let multi = ids.len() > 1;
        {
            let frame = &self.frames[depth];
            frame.require_active()?;
            if frame.has_branches() {
                return Err(ProtocolViolation::BranchesRegistered { frame: frame.id() }.into());
            }
            if ids.iter().any(|id| id.is_none()) {
                return Err(ProtocolViolation::ReservedBranchId.into());
            }
            if multi && frame.saved {
                return Err(ProtocolViolation::SnapshotTaken { frame: frame.id() }.into());
            }
        }
        if !ids.is_empty() && depth + 1 >= self.config.max_depth {
            return Err(note_capacity(StackError::DepthExceeded {
                max_depth: self.config.max_depth,
            }));
        }

        if multi {
            self.savepoint()?;
        }
        if let Err(e) = self.frames[depth].register_branches(ids) {
            self.rollback_branch(depth, multi);
            return Err(note_capacity(e));
        }
        debug!(
            depth,
            frame = self.frames[depth].id().0,
            branches = ids.len(),
            "register branch set"
        );

        let first = match self.frames[depth].next_branch_id() {
            Ok(first) => first,
            Err(e) => {
                self.rollback_branch(depth, multi);
                return Err(e);
            }
        };
        if first.is_some() {
            if let Err(e) = self.descend() {
                self.rollback_branch(depth, multi);
                return Err(e);
            }
            self.metrics.branches_taken += 1;
        }
        self.metrics.branch_sets += 1;
        Ok(first)
    }

    /// Undo a partially applied `branch`. The id list stays in the frame
    /// arena until the slot is next entered.
    fn rollback_branch(&mut self, depth: usize, drop_savepoint: bool) {
        let frame = &mut self.frames[depth];
        frame.abandon_branches();
        if drop_savepoint {
            frame.saved = false;
            self.metrics.savepoints -= 1;
            self.metrics.bytes_snapshotted -= frame.value_mark as u64;
        }
    }

    /// Move from the current branch to its next sibling.
    ///
    /// Consumes the next id of the parent frame's branch set. If there is
    /// one, the current frame is exited, the parent's savepoint restored,
    /// and a fresh child entered for it. If the set is exhausted, nothing
    /// changes and `None` is returned; the caller then ascends with
    /// [`exit`](Self::exit).
    pub fn next_branch(&mut self) -> Result<Option<BranchId>, StackError> {
        if self.depth == 0 {
            return Err(ProtocolViolation::NoParentFrame.into());
        }
        let parent = self.depth - 1;
        if self.frames[parent].branch_counts().1 > 0 && self.next_frame_id.successor().is_none() {
            return Err(note_capacity(StackError::FrameIdsExhausted));
        }
        let Some(id) = self.frames[parent].next_branch_id()? else {
            trace!(depth = parent, "branch set exhausted");
            return Ok(None);
        };
        self.exit()?;
        self.restore_prefix()?;
        self.descend()?;
        self.metrics.branches_taken += 1;
        debug!(depth = self.depth, branch = id.0, "next branch");
        Ok(Some(id))
    }

    // ── inspection ─────────────────────────────────────────────────

    /// Current depth; the root frame is depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Id of the current frame.
    pub fn frame_id(&self) -> FrameId {
        self.frames[self.depth].id()
    }

    /// Ids of every frame on the live path, root first.
    pub fn frame_path(&self) -> SmallVec<[FrameId; 16]> {
        self.frames[..=self.depth].iter().map(Frame::id).collect()
    }

    /// Snapshot of slot `depth`, or `None` past `max_depth`.
    pub fn frame_info(&self, depth: usize) -> Option<FrameInfo> {
        let frame = self.frames.get(depth)?;
        let (branches_total, branches_remaining) = frame.branch_counts();
        Some(FrameInfo {
            depth: frame.depth(),
            id: frame.id(),
            active: frame.is_active(),
            constructed: frame.is_constructed(),
            value_base: frame.value_base(),
            value_mark: frame.value_mark,
            saved: frame.saved,
            branches_total,
            branches_remaining,
            local_used: frame.local_used(),
        })
    }

    /// The current frame's value-stack high-water mark.
    pub fn value_mark(&self) -> usize {
        self.frames[self.depth].value_mark
    }

    /// Value-stack bytes still free above the current mark.
    pub fn scratch_remaining(&self) -> usize {
        self.values.capacity() - self.value_mark()
    }

    /// Static-region bytes still free.
    pub fn static_remaining(&self) -> usize {
        self.static_region.remaining()
    }

    /// FNV-1a digest of the occupied value-stack prefix `[0, mark)`.
    ///
    /// Two branches of the same set see equal digests at entry.
    pub fn scratch_digest(&self) -> Result<u64, StackError> {
        Ok(self.values.digest(self.value_mark())?)
    }

    /// The configuration the stack was built with.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &StackMetrics {
        &self.metrics
    }

    /// Memory held by the static region, value stack, and every
    /// constructed frame arena.
    pub fn memory_bytes(&self) -> usize {
        self.static_region.memory_bytes()
            + self.values.memory_bytes()
            + self.frames.iter().map(Frame::memory_bytes).sum::<usize>()
    }
}

fn note_capacity_arena(err: ArenaError) -> StackError {
    note_capacity(StackError::Arena(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> FrameStack {
        FrameStack::new(StackConfig {
            max_depth: 4,
            static_capacity: 4096,
            frame_capacity: 256,
            scratch_capacity: 64,
        })
        .unwrap()
    }

    fn write_u64(stack: &mut FrameStack, span: &ValueSpan, v: u64) {
        stack.scratch_as_mut::<u64>(span).unwrap()[0] = v;
    }

    fn read_u64(stack: &FrameStack, span: &ValueSpan) -> u64 {
        stack.scratch_as::<u64>(span).unwrap()[0]
    }

    #[test]
    fn stack_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameStack>();
    }

    #[test]
    fn new_enters_root_frame() {
        let stack = small();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.frame_id(), FrameId::ROOT);
        assert_eq!(stack.metrics().frames_entered, 1);
        assert_eq!(stack.metrics().frame_arenas_constructed, 1);
        let info = stack.frame_info(0).unwrap();
        assert!(info.active);
        assert!(!stack.frame_info(1).unwrap().constructed);
        assert!(stack.frame_info(4).is_none());
    }

    #[test]
    fn invalid_config_rejected() {
        let err = FrameStack::new(StackConfig {
            max_depth: 0,
            ..StackConfig::default()
        })
        .err();
        assert_eq!(
            err,
            Some(StackError::Config(crate::config::ConfigError::ZeroDepth))
        );
    }

    #[test]
    fn frame_ids_are_monotonic() {
        let mut stack = small();
        assert_eq!(stack.enter().unwrap(), FrameId(2));
        stack.exit().unwrap();
        assert_eq!(stack.enter().unwrap(), FrameId(3));
        assert_eq!(stack.enter().unwrap(), FrameId(4));
        assert_eq!(
            stack.frame_path().as_slice(),
            &[FrameId(1), FrameId(3), FrameId(4)]
        );
    }

    #[test]
    fn exit_at_root_is_protocol_violation() {
        let mut stack = small();
        assert_eq!(
            stack.exit(),
            Err(StackError::Protocol(ProtocolViolation::ExitRoot))
        );
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn depth_limit_is_capacity_error() {
        let mut stack = small();
        for _ in 0..3 {
            stack.enter().unwrap();
        }
        let err = stack.enter().unwrap_err();
        assert_eq!(err, StackError::DepthExceeded { max_depth: 4 });
        assert!(err.is_capacity());
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.frame_id(), FrameId(4));
    }

    #[test]
    fn child_starts_at_parent_mark() {
        let mut stack = small();
        stack.alloc_scratch(12, 4).unwrap();
        stack.enter().unwrap();
        let info = stack.frame_info(1).unwrap();
        assert_eq!(info.value_base, 12);
        assert_eq!(info.value_mark, 12);
        let span = stack.alloc_scratch(8, 8).unwrap();
        assert_eq!(span.offset(), 16);
        stack.exit().unwrap();
        // The parent's mark is unaffected by the child's allocations.
        assert_eq!(stack.value_mark(), 12);
    }

    #[test]
    fn scratch_capacity_is_enforced() {
        let mut stack = small();
        stack.alloc_scratch(64, 1).unwrap();
        let err = stack.alloc_scratch(1, 1).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(stack.value_mark(), 64);
    }

    #[test]
    fn savepoint_restore_round_trip() {
        let mut stack = small();
        let span = stack.alloc_scratch_slice::<u64>(1).unwrap();
        write_u64(&mut stack, &span, 0xA);
        stack.savepoint().unwrap();
        write_u64(&mut stack, &span, 0xB);
        stack.restore().unwrap();
        assert_eq!(read_u64(&stack, &span), 0xA);
        // Restorable more than once.
        write_u64(&mut stack, &span, 0xC);
        stack.restore().unwrap();
        assert_eq!(read_u64(&stack, &span), 0xA);
        assert_eq!(stack.metrics().restores, 2);
        assert_eq!(stack.metrics().bytes_restored, 16);
    }

    #[test]
    fn double_savepoint_rejected() {
        let mut stack = small();
        stack.savepoint().unwrap();
        assert_eq!(
            stack.savepoint(),
            Err(StackError::Protocol(ProtocolViolation::SnapshotTaken {
                frame: FrameId::ROOT
            }))
        );
    }

    #[test]
    fn restore_without_savepoint_rejected() {
        let mut stack = small();
        assert_eq!(
            stack.restore(),
            Err(StackError::Protocol(ProtocolViolation::NoSnapshot {
                frame: FrameId::ROOT
            }))
        );
    }

    #[test]
    fn scratch_alloc_after_savepoint_rejected() {
        let mut stack = small();
        stack.savepoint().unwrap();
        assert!(stack.alloc_scratch(8, 8).unwrap_err().is_protocol());
        assert_eq!(stack.value_mark(), 0);
    }

    #[test]
    fn snapshot_buffer_allocated_once_per_slot() {
        let mut stack = small();
        stack.enter().unwrap();
        stack.savepoint().unwrap();
        let used = stack.static_remaining();
        stack.exit().unwrap();
        stack.enter().unwrap();
        stack.savepoint().unwrap();
        assert_eq!(stack.static_remaining(), used);
    }

    #[test]
    fn savepoint_fails_cleanly_when_static_region_full() {
        let mut stack = FrameStack::new(StackConfig {
            max_depth: 4,
            static_capacity: 32,
            frame_capacity: 256,
            scratch_capacity: 64,
        })
        .unwrap();
        let err = stack.savepoint().unwrap_err();
        assert!(err.is_capacity());
        assert!(!stack.frame_info(0).unwrap().saved);
    }

    #[test]
    fn ancestor_locals_stay_readable_from_children() {
        let mut stack = small();
        let root_local = stack.alloc_local(8, 8).unwrap();
        stack.local_mut(&root_local).unwrap().fill(7);
        assert!(stack.owns(&root_local));

        stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
        assert!(!stack.owns(&root_local));
        assert_eq!(stack.local(&root_local).unwrap(), &[7; 8]);
        stack.enter().unwrap();
        stack.local_mut(&root_local).unwrap()[0] = 1;

        let child_local = stack.alloc_local(8, 8).unwrap();
        stack.local_mut(&child_local).unwrap().fill(9);
        stack.exit().unwrap();
        // The exited slot's memory is no longer reachable.
        assert_eq!(
            stack.local(&child_local),
            Err(StackError::Protocol(ProtocolViolation::FrameNotActive {
                depth: 2
            }))
        );
        stack.next_branch().unwrap();
        assert_eq!(stack.local(&root_local).unwrap()[0], 1);
    }

    #[test]
    fn local_span_from_another_stack_is_foreign() {
        let mut other = small();
        let span = other.alloc_local(8, 8).unwrap();
        let stack = small();
        assert!(!stack.owns(&span));
        assert!(matches!(
            stack.local(&span),
            Err(StackError::Arena(ArenaError::ForeignSpan { .. }))
        ));
    }

    #[test]
    fn reentry_resets_local_arena() {
        let mut stack = small();
        stack.enter().unwrap();
        let first = stack.alloc_local(16, 8).unwrap();
        stack.exit().unwrap();
        stack.enter().unwrap();
        let second = stack.alloc_local(16, 8).unwrap();
        assert_eq!(first.offset(), second.offset());
        assert!(!stack.owns(&first));
        assert!(matches!(
            stack.local(&first),
            Err(StackError::Arena(ArenaError::StaleSpan { .. }))
        ));
    }

    #[test]
    fn static_allocations_survive_frames() {
        let mut stack = small();
        stack.enter().unwrap();
        let span = stack.alloc_static(4, 4).unwrap();
        stack.static_bytes_mut(&span).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        stack.exit().unwrap();
        stack.enter().unwrap();
        assert_eq!(stack.static_bytes(&span).unwrap(), &[1, 2, 3, 4]);
        let aligned = stack.alloc_static_default(1).unwrap();
        assert_eq!(aligned.offset() % sprig_arena::REGION_ALIGN, 0);
    }

    #[test]
    fn value_span_from_exited_frame_is_stale() {
        let mut stack = small();
        stack.enter().unwrap();
        let child_id = stack.frame_id();
        let span = stack.alloc_scratch(8, 8).unwrap();
        stack.exit().unwrap();
        assert_eq!(
            stack.scratch(&span),
            Err(StackError::Protocol(ProtocolViolation::StaleValueSpan {
                frame: child_id
            }))
        );
    }

    #[test]
    fn branch_descends_into_first_id() {
        let mut stack = small();
        let ids = [BranchId(10), BranchId(20)];
        assert_eq!(stack.branch(&ids).unwrap(), Some(BranchId(10)));
        assert_eq!(stack.depth(), 1);
        let parent = stack.frame_info(0).unwrap();
        assert!(parent.saved);
        assert_eq!(parent.branches_total, 2);
        assert_eq!(parent.branches_remaining, 1);
    }

    #[test]
    fn single_branch_skips_savepoint() {
        let mut stack = small();
        assert_eq!(stack.branch(&[BranchId(5)]).unwrap(), Some(BranchId(5)));
        assert!(!stack.frame_info(0).unwrap().saved);
        assert_eq!(stack.metrics().savepoints, 0);
        assert_eq!(stack.next_branch().unwrap(), None);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn empty_branch_set_returns_none() {
        let mut stack = small();
        assert_eq!(stack.branch(&[]).unwrap(), None);
        assert_eq!(stack.depth(), 0);
        assert!(stack.alloc_scratch(8, 8).unwrap_err().is_protocol());
    }

    #[test]
    fn branch_twice_rejected() {
        let mut stack = small();
        stack.branch(&[]).unwrap();
        assert_eq!(
            stack.branch(&[BranchId(1)]),
            Err(StackError::Protocol(ProtocolViolation::BranchesRegistered {
                frame: FrameId::ROOT
            }))
        );
    }

    #[test]
    fn branch_with_reserved_id_rejected() {
        let mut stack = small();
        assert_eq!(
            stack.branch(&[BranchId(1), BranchId::NONE]),
            Err(StackError::Protocol(ProtocolViolation::ReservedBranchId))
        );
        let info = stack.frame_info(0).unwrap();
        assert!(!info.saved);
        assert_eq!(info.branches_total, 0);
        // The frame is still usable.
        stack.alloc_scratch(8, 8).unwrap();
    }

    #[test]
    fn branch_at_last_slot_is_capacity_error_without_side_effects() {
        let mut stack = small();
        for _ in 0..3 {
            stack.enter().unwrap();
        }
        let err = stack.branch(&[BranchId(1), BranchId(2)]).unwrap_err();
        assert!(err.is_capacity());
        let info = stack.frame_info(3).unwrap();
        assert!(!info.saved);
        assert_eq!(info.branches_total, 0);
    }

    #[test]
    fn branch_set_too_large_for_frame_arena_rolls_back() {
        let mut stack = small();
        stack.alloc_scratch(8, 8).unwrap();
        // 256-byte frame arena holds at most 32 ids.
        let ids: Vec<BranchId> = (1..=33).map(BranchId).collect();
        let err = stack.branch(&ids).unwrap_err();
        assert!(err.is_capacity());
        let info = stack.frame_info(0).unwrap();
        assert!(!info.saved);
        assert_eq!(info.branches_total, 0);
        assert_eq!(stack.depth(), 0);

        let m = stack.metrics();
        assert_eq!(m.savepoints, 0);
        assert_eq!(m.bytes_snapshotted, 0);
        assert_eq!(m.branch_sets, 0);
        // A later savepoint is counted normally.
        stack.savepoint().unwrap();
        assert_eq!(stack.metrics().bytes_snapshotted, 8);
    }

    #[test]
    fn frame_with_branch_set_rejects_enter() {
        let mut stack = small();
        stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
        stack.exit().unwrap();
        assert_eq!(
            stack.enter(),
            Err(StackError::Protocol(ProtocolViolation::BranchesRegistered {
                frame: FrameId::ROOT
            }))
        );
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.frame_info(0).unwrap().branches_remaining, 1);
    }

    #[test]
    fn frame_with_branch_set_rejects_savepoint_and_restore() {
        let mut stack = small();
        stack.branch(&[]).unwrap();
        let expected = Err(StackError::Protocol(ProtocolViolation::BranchesRegistered {
            frame: FrameId::ROOT,
        }));
        assert_eq!(stack.savepoint(), expected);
        assert!(!stack.frame_info(0).unwrap().saved);

        let mut stack = small();
        stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
        stack.exit().unwrap();
        assert_eq!(stack.restore(), expected);
        assert_eq!(stack.metrics().restores, 0);
    }

    #[test]
    fn next_branch_keeps_id_when_frame_ids_run_out() {
        let mut stack = small();
        stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
        let child = stack.frame_id();
        stack.next_frame_id = FrameId(u32::MAX);

        assert_eq!(stack.next_branch(), Err(StackError::FrameIdsExhausted));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.frame_id(), child);
        assert_eq!(stack.frame_info(0).unwrap().branches_remaining, 1);
        assert_eq!(stack.metrics().restores, 0);
    }

    #[test]
    fn next_branch_at_root_rejected() {
        let mut stack = small();
        assert_eq!(
            stack.next_branch(),
            Err(StackError::Protocol(ProtocolViolation::NoParentFrame))
        );
    }

    #[test]
    fn next_branch_without_parent_set_rejected() {
        let mut stack = small();
        stack.enter().unwrap();
        assert_eq!(
            stack.next_branch(),
            Err(StackError::Protocol(
                ProtocolViolation::NoBranchesRegistered {
                    frame: FrameId::ROOT
                }
            ))
        );
    }

    #[test]
    fn next_branch_restores_parent_state() {
        let mut stack = small();
        let a = stack.alloc_scratch_slice::<u64>(1).unwrap();
        write_u64(&mut stack, &a, 1);
        stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
        write_u64(&mut stack, &a, 99);
        assert_eq!(stack.next_branch().unwrap(), Some(BranchId(2)));
        assert_eq!(read_u64(&stack, &a), 1);
        assert_eq!(stack.frame_id(), FrameId(3));
        assert_eq!(stack.next_branch().unwrap(), None);
        assert_eq!(stack.depth(), 1);
        stack.exit().unwrap();
        assert_eq!(stack.depth(), 0);
    }
}
