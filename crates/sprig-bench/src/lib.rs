//! Benchmark profiles for the Sprig frame stack.
//!
//! - [`wide_profile`]: shallow stack, large value stack, wide fan-out
//! - [`deep_profile`]: deep stack, small value stack, narrow fan-out
//! - [`branch_set`]: the id list used for a fan-out of `width`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use sprig_core::BranchId;
use sprig_frame::StackConfig;

/// 4 levels, 64 KiB of scratch: savepoint/restore copy cost dominates.
pub fn wide_profile() -> StackConfig {
    StackConfig {
        max_depth: 4,
        static_capacity: 4 * 64 * 1024 + 4096,
        frame_capacity: 16 * 1024,
        scratch_capacity: 64 * 1024,
    }
}

/// 32 levels, 1 KiB of scratch: frame enter/exit cost dominates.
pub fn deep_profile() -> StackConfig {
    StackConfig {
        max_depth: 32,
        static_capacity: 32 * 1024 + 4096,
        frame_capacity: 1024,
        scratch_capacity: 1024,
    }
}

/// Branch ids `1..=width`.
pub fn branch_set(width: u64) -> Vec<BranchId> {
    (1..=width).map(BranchId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_valid() {
        wide_profile().validate().unwrap();
        deep_profile().validate().unwrap();
    }

    #[test]
    fn branch_set_skips_reserved_id() {
        let ids = branch_set(3);
        assert_eq!(ids, [BranchId(1), BranchId(2), BranchId(3)]);
    }
}
