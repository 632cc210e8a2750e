//! Cumulative counters for a frame stack.
//!
//! [`StackMetrics`] is updated in place by every [`FrameStack`](crate::FrameStack)
//! operation. It is cheap enough to leave on unconditionally and lets a
//! driver see how much copy bandwidth its branch fan-out is costing.

/// Counters collected over the lifetime of one frame stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackMetrics {
    /// Frame entries, including the root.
    pub frames_entered: u64,
    /// Frame exits.
    pub frames_exited: u64,
    /// Frame arenas constructed (at most one per depth slot).
    pub frame_arenas_constructed: u32,
    /// Branch sets registered.
    pub branch_sets: u64,
    /// Branches descended into, via `branch` or `next_branch`.
    pub branches_taken: u64,
    /// Savepoints taken.
    pub savepoints: u64,
    /// Restores performed.
    pub restores: u64,
    /// Bytes copied out of the value stack by savepoints.
    pub bytes_snapshotted: u64,
    /// Bytes copied back into the value stack by restores.
    pub bytes_restored: u64,
    /// Deepest depth reached.
    pub deepest: usize,
    /// Highest value-stack mark reached.
    pub scratch_high_water: usize,
}
