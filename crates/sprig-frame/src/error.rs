//! Frame stack error types.
//!
//! Failures fall into two classes. A [`ProtocolViolation`] means the caller
//! invoked an operation while its precondition was false; it is a bug in
//! the driver and the stack is left exactly as it was before the call.
//! Capacity failures ([`StackError::DepthExceeded`] and arena
//! [`CapacityExceeded`](sprig_arena::ArenaError::CapacityExceeded)) are
//! legitimate runtime conditions a driver may react to, e.g. by narrowing
//! its branch fan-out.

use std::error::Error;
use std::fmt;

use sprig_arena::ArenaError;
use sprig_core::FrameId;

use crate::config::ConfigError;

/// An operation was called while its precondition was false.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `enter` on a slot that is already on the live path.
    FrameAlreadyActive {
        /// Depth of the slot.
        depth: usize,
    },
    /// An operation that needs a live frame found the slot inactive.
    FrameNotActive {
        /// Depth of the slot.
        depth: usize,
    },
    /// `exit` at depth 0. The root frame lives as long as the stack.
    ExitRoot,
    /// `next_branch` at depth 0, where there is no parent branch set.
    NoParentFrame,
    /// `savepoint`, `branch` over several ids, or a value-stack allocation
    /// while the frame already holds a savepoint.
    SnapshotTaken {
        /// The frame holding the savepoint.
        frame: FrameId,
    },
    /// `restore` without a prior `savepoint` on this frame.
    NoSnapshot {
        /// The current frame.
        frame: FrameId,
    },
    /// `branch` or a value-stack allocation on a frame that has already
    /// registered a branch set.
    BranchesRegistered {
        /// The frame owning the branch set.
        frame: FrameId,
    },
    /// `next_branch` whose parent frame never registered a branch set.
    NoBranchesRegistered {
        /// The parent frame.
        frame: FrameId,
    },
    /// A branch set contained the reserved "no branch" id.
    ReservedBranchId,
    /// A value span whose allocating frame is no longer on the live path.
    StaleValueSpan {
        /// The frame that made the allocation.
        frame: FrameId,
    },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameAlreadyActive { depth } => {
                write!(f, "frame slot {depth} is already active")
            }
            Self::FrameNotActive { depth } => write!(f, "frame slot {depth} is not active"),
            Self::ExitRoot => write!(f, "cannot exit the root frame"),
            Self::NoParentFrame => write!(f, "root frame has no parent branch set"),
            Self::SnapshotTaken { frame } => {
                write!(f, "frame {frame} already holds a savepoint")
            }
            Self::NoSnapshot { frame } => write!(f, "frame {frame} has no savepoint"),
            Self::BranchesRegistered { frame } => {
                write!(f, "frame {frame} has already registered a branch set")
            }
            Self::NoBranchesRegistered { frame } => {
                write!(f, "frame {frame} has no branch set")
            }
            Self::ReservedBranchId => write!(f, "branch id 0 is reserved"),
            Self::StaleValueSpan { frame } => {
                write!(f, "value span from exited frame {frame}")
            }
        }
    }
}

impl Error for ProtocolViolation {}

/// Errors returned by [`FrameStack`](crate::FrameStack) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// The caller broke the frame protocol.
    Protocol(ProtocolViolation),
    /// `enter` (directly or via `branch`/`next_branch`) at the last slot.
    DepthExceeded {
        /// The configured number of slots.
        max_depth: usize,
    },
    /// The `u32` frame-id space has been used up.
    FrameIdsExhausted,
    /// An arena allocation or span lookup failed.
    Arena(ArenaError),
    /// The stack configuration was rejected.
    Config(ConfigError),
}

impl StackError {
    /// Whether this is a runtime shortage of depth or memory.
    pub fn is_capacity(&self) -> bool {
        match self {
            Self::DepthExceeded { .. } | Self::FrameIdsExhausted => true,
            Self::Arena(e) => e.is_capacity(),
            _ => false,
        }
    }

    /// Whether this is a caller protocol violation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol violation: {e}"),
            Self::DepthExceeded { max_depth } => {
                write!(f, "frame stack depth limit {max_depth} reached")
            }
            Self::FrameIdsExhausted => write!(f, "frame id space exhausted"),
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl Error for StackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Protocol(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolViolation> for StackError {
    fn from(e: ProtocolViolation) -> Self {
        Self::Protocol(e)
    }
}

impl From<ArenaError> for StackError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<ConfigError> for StackError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
