//! Sprig: a deterministic, bounded-memory frame stack for exploring
//! alternative futures of a simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Sprig sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use sprig::prelude::*;
//!
//! let mut stack = FrameStack::new(StackConfig {
//!     max_depth: 4,
//!     static_capacity: 4096,
//!     frame_capacity: 1024,
//!     scratch_capacity: 256,
//! })
//! .unwrap();
//!
//! // Shared state lives in the value stack.
//! let gold = stack.alloc_scratch_slice::<i64>(1).unwrap();
//! stack.scratch_as_mut::<i64>(&gold).unwrap()[0] = 100;
//!
//! // Try three purchases; each starts from 100 gold.
//! let prices = [30, 80, 120];
//! let ids: Vec<BranchId> = (1..=prices.len() as u64).map(BranchId).collect();
//! let mut affordable = Vec::new();
//! let mut next = stack.branch(&ids).unwrap();
//! while let Some(id) = next {
//!     let purse = &mut stack.scratch_as_mut::<i64>(&gold).unwrap()[0];
//!     *purse -= prices[id.0 as usize - 1];
//!     if *purse >= 0 {
//!         affordable.push(id.0);
//!     }
//!     next = stack.next_branch().unwrap();
//! }
//! stack.exit().unwrap();
//! assert_eq!(affordable, [1, 2]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sprig-core` | Frame, branch and region ids |
//! | [`arena`] | `sprig-arena` | Bump arenas, static region, value stack, spans |
//! | [`frame`] | `sprig-frame` | `FrameStack`, config, errors, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids shared by every layer (`sprig-core`).
pub use sprig_core as types;

/// Memory regions and span handles (`sprig-arena`).
///
/// Most users only touch [`arena::Span`] and [`arena::ValueSpan`], which
/// are also in the [`prelude`].
pub use sprig_arena as arena;

/// The frame stack and branch protocol (`sprig-frame`).
pub use sprig_frame as frame;

/// Common imports for typical Sprig usage.
///
/// ```rust
/// use sprig::prelude::*;
/// ```
pub mod prelude {
    // Ids
    pub use sprig_core::{BranchId, FrameId};

    // Handles
    pub use sprig_arena::{ArenaError, Span, ValueSpan};

    // Stack
    pub use sprig_frame::{
        ConfigError, FrameInfo, FrameStack, ProtocolViolation, StackConfig, StackError,
        StackMetrics,
    };
}
