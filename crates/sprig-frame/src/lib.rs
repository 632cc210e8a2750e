//! Fixed-depth frame stack with branch checkpoint/restore.
//!
//! A [`FrameStack`] is built for drivers that explore alternatives: at a
//! decision point the driver registers a set of branch ids, the stack
//! snapshots the shared value stack, and each branch is simulated in a
//! fresh child frame that starts from identical bytes. Memory is bounded
//! by [`StackConfig`] and reserved up front (frame arenas lazily, once
//! per slot), so a long exploration never allocates from the heap in its
//! steady state.
//!
//! # Example
//!
//! ```
//! use sprig_frame::{FrameStack, StackConfig};
//! use sprig_core::BranchId;
//!
//! let mut stack = FrameStack::new(StackConfig::default()).unwrap();
//! let hp = stack.alloc_scratch_slice::<u32>(1).unwrap();
//! stack.scratch_as_mut::<u32>(&hp).unwrap()[0] = 10;
//!
//! let mut outcomes = Vec::new();
//! let mut next = stack.branch(&[BranchId(1), BranchId(2)]).unwrap();
//! while let Some(id) = next {
//!     stack.scratch_as_mut::<u32>(&hp).unwrap()[0] -= id.0 as u32;
//!     outcomes.push(stack.scratch_as::<u32>(&hp).unwrap()[0]);
//!     next = stack.next_branch().unwrap();
//! }
//! stack.exit().unwrap();
//! assert_eq!(outcomes, [9, 8]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod branch;
pub mod config;
pub mod error;
mod frame;
pub mod metrics;
pub mod stack;

pub use config::{ConfigError, StackConfig};
pub use error::{ProtocolViolation, StackError};
pub use metrics::StackMetrics;
pub use stack::{FrameInfo, FrameStack};

pub use sprig_core::{BranchId, FrameId};
