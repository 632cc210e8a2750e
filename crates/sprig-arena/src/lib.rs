//! Bump arenas, static region, and snapshot-able value stack for Sprig.
//!
//! Provides the three memory lifetimes used by the frame stack. This crate
//! is the only one in the workspace that contains `unsafe` code, confined
//! to the `Pod` impls in `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! StaticRegion   ←─── one per stack, never reset (snapshot buffers live here)
//! BumpArena × N  ←─── one per frame slot, reset on every re-entry
//! ValueStack     ←─── one per stack, partitioned by depth, copied on savepoint
//! ```
//!
//! Every region starts on a [`REGION_ALIGN`]-byte boundary. Allocations
//! hand out [`Span`] / [`ValueSpan`] handles rather than pointers; handles
//! carry the id of the region that produced them (and, for bump arenas,
//! the reset epoch) so misuse is reported as an [`ArenaError`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod bump;
pub mod error;
pub mod hash;
mod raw;
pub mod scratch;
pub mod span;
pub mod static_arena;

// Public re-exports for the primary API surface.
pub use bump::BumpArena;
pub use error::ArenaError;
pub use hash::fnv1a;
pub use raw::{cast_slice, cast_slice_mut, REGION_ALIGN};
pub use scratch::ValueStack;
pub use span::{Span, ValueSpan};
pub use static_arena::StaticRegion;
