//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use sprig_core::RegionId;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The region does not have enough room left for the request.
    CapacityExceeded {
        /// Number of bytes requested (including alignment padding).
        requested: usize,
        /// Bytes still free before the request.
        remaining: usize,
        /// Total capacity of the region.
        capacity: usize,
    },
    /// The backing memory for a region could not be reserved.
    ReservationFailed {
        /// Number of bytes that could not be reserved.
        requested: usize,
    },
    /// A region larger than `u32::MAX` bytes was requested.
    RegionTooLarge {
        /// The requested region size in bytes.
        requested: usize,
    },
    /// Alignment is zero, not a power of two, or wider than
    /// [`REGION_ALIGN`](crate::REGION_ALIGN).
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// A [`Span`](crate::Span) from an arena that has since been reset.
    StaleSpan {
        /// The epoch encoded in the span.
        span_epoch: u32,
        /// The arena's current epoch.
        current_epoch: u32,
    },
    /// A span presented to a region that did not produce it.
    ForeignSpan {
        /// The region the span was presented to.
        expected: RegionId,
        /// The region recorded in the span.
        found: RegionId,
    },
    /// A span reaches past the live part of its region.
    OutOfBounds {
        /// End offset of the span.
        end: usize,
        /// First offset that is not readable.
        limit: usize,
    },
    /// A byte range cannot be viewed as a slice of the requested type.
    Layout {
        /// `size_of` the target type.
        size: usize,
        /// `align_of` the target type.
        align: usize,
        /// Length of the byte range.
        len: usize,
    },
}

impl ArenaError {
    /// Whether this error reports a legitimate runtime shortage of memory,
    /// as opposed to a misused handle or argument.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::ReservationFailed { .. }
        )
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                remaining,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, \
                     {remaining} of {capacity} bytes remaining"
                )
            }
            Self::ReservationFailed { requested } => {
                write!(f, "could not reserve {requested} bytes of backing memory")
            }
            Self::RegionTooLarge { requested } => {
                write!(f, "region of {requested} bytes exceeds u32::MAX")
            }
            Self::InvalidAlignment { align } => {
                write!(f, "invalid alignment {align}")
            }
            Self::StaleSpan {
                span_epoch,
                current_epoch,
            } => {
                write!(
                    f,
                    "stale span: epoch {span_epoch}, arena is at epoch {current_epoch}"
                )
            }
            Self::ForeignSpan { expected, found } => {
                write!(f, "span from region {found} presented to region {expected}")
            }
            Self::OutOfBounds { end, limit } => {
                write!(f, "span ends at {end}, past live limit {limit}")
            }
            Self::Layout { size, align, len } => {
                write!(
                    f,
                    "cannot view {len} bytes as elements of size {size}, align {align}"
                )
            }
        }
    }
}

impl Error for ArenaError {}
