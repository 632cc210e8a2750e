//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one entry into a frame slot.
///
/// Ids are handed out by the frame stack from a monotonic counter starting
/// at 1, so two entries into the same depth slot always carry different
/// ids. `FrameId(0)` is reserved for "no frame".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    /// Reserved "no frame" id.
    pub const NONE: FrameId = FrameId(0);

    /// The id given to the root frame at stack construction.
    pub const ROOT: FrameId = FrameId(1);

    /// Whether this is the reserved "no frame" id.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// The id that follows this one.
    ///
    /// Returns `None` once the `u32` space is exhausted.
    pub fn successor(self) -> Option<FrameId> {
        self.0.checked_add(1).map(FrameId)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FrameId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Caller-chosen identifier for one continuation in a branch set.
///
/// Branch ids are opaque to the engine; they are handed back in order as
/// the set is explored. `BranchId(0)` is reserved to mean "no branch" and
/// is rejected when a branch set is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub u64);

impl BranchId {
    /// Reserved "no branch" id.
    pub const NONE: BranchId = BranchId(0);

    /// Whether this is the reserved "no branch" id.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BranchId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Counter for unique [`RegionId`] allocation.
static REGION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a memory region.
///
/// Every bump arena, static region, and value stack gets its own id at
/// construction. Spans carry the id of the region that produced them, so
/// a span presented to the wrong region is detected instead of silently
/// aliasing unrelated bytes. Ids are never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    /// Allocate a fresh, unique region id. Thread-safe.
    pub fn next() -> Self {
        Self(REGION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_id_reserved_values() {
        assert!(FrameId::NONE.is_none());
        assert!(!FrameId::ROOT.is_none());
        assert_eq!(FrameId::ROOT.successor(), Some(FrameId(2)));
        assert_eq!(FrameId(u32::MAX).successor(), None);
    }

    #[test]
    fn branch_id_none_is_zero() {
        assert!(BranchId::NONE.is_none());
        assert!(!BranchId(10).is_none());
        assert_eq!(BranchId::from(7u64), BranchId(7));
    }

    #[test]
    fn region_ids_are_unique() {
        let a = RegionId::next();
        let b = RegionId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(FrameId(3).to_string(), "3");
        assert_eq!(BranchId(30).to_string(), "30");
    }
}
