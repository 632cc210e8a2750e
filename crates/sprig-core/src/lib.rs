//! Core identifiers for the Sprig branching simulation substrate.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! strongly-typed ids shared by the arena and frame-stack crates: frame
//! ids, branch ids, and region ids.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;

pub use id::{BranchId, FrameId, RegionId};
