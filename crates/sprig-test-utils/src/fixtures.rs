//! Reusable expansion fixtures.
//!
//! - [`FanOut`]: a uniform tree that writes one path-derived word per node
//!   and checks every ancestor's word on arrival, so any leak between
//!   sibling branches shows up as a violation.
//! - [`Failing`]: wraps another expander and fails after N nodes.

use sprig_arena::ValueSpan;
use sprig_core::BranchId;
use sprig_frame::{FrameStack, ProtocolViolation, StackError};

use crate::Expand;

/// Deterministic word for a branch path (FNV-style fold, never zero).
pub fn encode_path(path: &[BranchId]) -> u64 {
    path.iter()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, id| {
            (h ^ id.0).wrapping_mul(0x0000_0100_0000_01B3)
        })
        | 1
}

/// Uniform tree of `width` children per node, `depth` levels deep.
///
/// Each node allocates one `u64` of scratch and stores
/// [`encode_path`] of its path there. On arrival every ancestor's word is
/// re-read; mismatches and non-zero fresh allocations are counted in
/// `violations`.
pub struct FanOut {
    pub width: u64,
    pub depth: usize,
    pub nodes: usize,
    pub violations: usize,
    spans: Vec<ValueSpan>,
}

impl FanOut {
    pub fn new(width: u64, depth: usize) -> Self {
        Self {
            width,
            depth,
            nodes: 0,
            violations: 0,
            spans: Vec::new(),
        }
    }

    /// Number of leaves a complete walk reaches.
    pub fn leaf_count(&self) -> usize {
        (self.width as usize).pow(self.depth as u32)
    }
}

impl Expand for FanOut {
    fn expand(
        &mut self,
        stack: &mut FrameStack,
        path: &[BranchId],
    ) -> Result<Vec<BranchId>, StackError> {
        self.nodes += 1;
        self.spans.truncate(path.len());
        for (level, span) in self.spans.iter().enumerate() {
            if stack.scratch_as::<u64>(span)?[0] != encode_path(&path[..level]) {
                self.violations += 1;
            }
        }

        let span = stack.alloc_scratch_slice::<u64>(1)?;
        let word = stack.scratch_as_mut::<u64>(&span)?;
        if word[0] != 0 {
            self.violations += 1;
        }
        word[0] = encode_path(path);
        self.spans.push(span);

        if path.len() >= self.depth {
            return Ok(Vec::new());
        }
        Ok((1..=self.width).map(BranchId).collect())
    }
}

/// Delegates to `inner` for `budget` nodes, then fails every call with a
/// protocol error, to exercise error propagation out of a walk.
pub struct Failing<E> {
    pub inner: E,
    pub budget: usize,
}

impl<E: Expand> Expand for Failing<E> {
    fn expand(
        &mut self,
        stack: &mut FrameStack,
        path: &[BranchId],
    ) -> Result<Vec<BranchId>, StackError> {
        if self.budget == 0 {
            return Err(ProtocolViolation::NoBranchesRegistered {
                frame: stack.frame_id(),
            }
            .into());
        }
        self.budget -= 1;
        self.inner.expand(stack, path)
    }
}
