//! Frame stack configuration and validation.

use std::error::Error;
use std::fmt;

/// Static bounds for a [`FrameStack`](crate::FrameStack).
///
/// All values are fixed at construction; the stack never grows past them.
/// Validated by [`StackConfig::validate`] when the stack is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackConfig {
    /// Number of frame slots, including the root. `enter()` fails once
    /// `depth + 1 == max_depth`. Default: 32.
    pub max_depth: usize,
    /// Bytes in the stack-lifetime static region. Snapshot buffers
    /// (one `scratch_capacity`-sized buffer per depth that ever takes a
    /// savepoint) are allocated from here. Default: 4 MiB.
    pub static_capacity: usize,
    /// Bytes in each frame's private bump arena. Default: 256 KiB.
    pub frame_capacity: usize,
    /// Bytes in the shared value stack. Default: 64 KiB.
    pub scratch_capacity: usize,
}

impl StackConfig {
    /// Default number of frame slots.
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Default static region size: 4 MiB.
    pub const DEFAULT_STATIC_CAPACITY: usize = 4 * 1024 * 1024;

    /// Default per-frame arena size: 256 KiB.
    pub const DEFAULT_FRAME_CAPACITY: usize = 256 * 1024;

    /// Default value stack size: 64 KiB.
    pub const DEFAULT_SCRATCH_CAPACITY: usize = 64 * 1024;

    /// Create a config with default values for every bound.
    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            static_capacity: Self::DEFAULT_STATIC_CAPACITY,
            frame_capacity: Self::DEFAULT_FRAME_CAPACITY,
            scratch_capacity: Self::DEFAULT_SCRATCH_CAPACITY,
        }
    }

    /// Static capacity needed so that every depth can hold a snapshot.
    ///
    /// Does not account for caller static allocations or alignment
    /// padding between buffers.
    pub fn snapshot_budget(&self) -> usize {
        self.max_depth.saturating_mul(self.scratch_capacity)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if u32::try_from(self.max_depth).is_err() {
            return Err(ConfigError::DepthOverflow {
                value: self.max_depth,
            });
        }
        for (name, value) in [
            ("static_capacity", self.static_capacity),
            ("frame_capacity", self.frame_capacity),
            ("scratch_capacity", self.scratch_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity { name });
            }
            if u32::try_from(value).is_err() {
                return Err(ConfigError::CapacityOverflow { name, value });
            }
        }
        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors detected during [`StackConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_depth` is zero; there must be room for the root frame.
    ZeroDepth,
    /// `max_depth` exceeds `u32::MAX`.
    DepthOverflow {
        /// The configured depth.
        value: usize,
    },
    /// A capacity is zero.
    ZeroCapacity {
        /// Which capacity field.
        name: &'static str,
    },
    /// A capacity exceeds `u32::MAX` (spans store `u32` offsets).
    CapacityOverflow {
        /// Which capacity field.
        name: &'static str,
        /// The configured value.
        value: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDepth => write!(f, "max_depth must be at least 1"),
            Self::DepthOverflow { value } => {
                write!(f, "max_depth {value} exceeds u32::MAX")
            }
            Self::ZeroCapacity { name } => write!(f, "{name} must be non-zero"),
            Self::CapacityOverflow { name, value } => {
                write!(f, "{name} {value} exceeds u32::MAX")
            }
        }
    }
}

impl Error for ConfigError {}
