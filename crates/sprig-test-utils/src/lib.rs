//! Test utilities for Sprig development.
//!
//! Provides [`explore`], a deterministic depth-first driver over the
//! branch protocol, plus small-stack constructors and the expansion
//! fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use sprig_core::BranchId;
use sprig_frame::{FrameStack, StackConfig, StackError};

/// A stack with `max_depth` slots and `scratch` bytes of value stack.
///
/// Static and frame capacities are sized generously for tests: one
/// snapshot buffer per slot plus slack.
pub fn small_stack(max_depth: usize, scratch: usize) -> FrameStack {
    FrameStack::new(small_config(max_depth, scratch)).expect("small_stack config is valid")
}

pub fn small_config(max_depth: usize, scratch: usize) -> StackConfig {
    StackConfig {
        max_depth,
        static_capacity: (max_depth + 1) * (scratch + 64),
        frame_capacity: 4096,
        scratch_capacity: scratch,
    }
}

/// Convenience: `[10, 20]` → `[BranchId(10), BranchId(20)]`.
pub fn branch_ids(raw: &[u64]) -> Vec<BranchId> {
    raw.iter().copied().map(BranchId).collect()
}

/// Expands one node of an exploration tree.
///
/// Called once per node, with the stack positioned in that node's frame
/// and `path` holding the branch ids taken from the starting frame. The
/// node may allocate and write scratch, then returns the ids of its
/// children; an empty list makes it a leaf.
pub trait Expand {
    fn expand(
        &mut self,
        stack: &mut FrameStack,
        path: &[BranchId],
    ) -> Result<Vec<BranchId>, StackError>;
}

impl<F> Expand for F
where
    F: FnMut(&mut FrameStack, &[BranchId]) -> Result<Vec<BranchId>, StackError>,
{
    fn expand(
        &mut self,
        stack: &mut FrameStack,
        path: &[BranchId],
    ) -> Result<Vec<BranchId>, StackError> {
        self(stack, path)
    }
}

/// One leaf reached by [`explore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub path: Vec<BranchId>,
    pub depth: usize,
    /// Scratch digest on arrival at the leaf, after its expansion ran.
    pub digest: u64,
}

/// Walk the whole branch tree below the current frame depth-first.
///
/// Leaves are returned in visiting order. On success the stack is back
/// at the depth it started from; on error it is left where the failure
/// happened.
pub fn explore<E: Expand>(
    stack: &mut FrameStack,
    expander: &mut E,
) -> Result<Vec<Leaf>, StackError> {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    visit(stack, expander, &mut path, &mut leaves)?;
    Ok(leaves)
}

fn visit<E: Expand>(
    stack: &mut FrameStack,
    expander: &mut E,
    path: &mut Vec<BranchId>,
    leaves: &mut Vec<Leaf>,
) -> Result<(), StackError> {
    let children = expander.expand(stack, path)?;
    if children.is_empty() {
        leaves.push(Leaf {
            path: path.clone(),
            depth: stack.depth(),
            digest: stack.scratch_digest()?,
        });
        return Ok(());
    }

    let mut next = stack.branch(&children)?;
    while let Some(id) = next {
        path.push(id);
        visit(stack, expander, path, leaves)?;
        path.pop();
        next = stack.next_branch()?;
    }
    stack.exit()
}
