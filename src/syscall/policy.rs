//! Fault and Termination Policy
//!
//! Every crossing ends in exactly one [`Outcome`]. Faults never propagate
//! past the boundary: they are resolved here into either a result word or
//! the termination of the calling process.

use super::table::FaultPolicy;
use crate::config::ABNORMAL_EXIT;

/// Result word for -1.
pub const ERROR_WORD: u32 = u32::MAX;

/// How one boundary crossing ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Write this word to the return slot and resume the caller.
    Return(u32),
    /// Resume the caller without touching the return slot.
    Done,
    /// Close the caller's descriptors and terminate it with this status.
    Terminate(i32),
    /// Power the machine off.
    Halt,
}

impl Outcome {
    /// The -1 failure result.
    pub const FAILURE: Self = Self::Return(ERROR_WORD);

    /// Abnormal termination for a malformed frame or a protocol violation.
    pub const KILL: Self = Self::Terminate(ABNORMAL_EXIT);

    /// A signed result (pid, status, count, or -1).
    #[inline]
    pub const fn signed(value: i32) -> Self {
        Self::Return(value as u32)
    }

    /// A boolean result (1 or 0).
    #[inline]
    pub const fn boolean(value: bool) -> Self {
        Self::Return(value as u32)
    }

    /// A byte count bounded by a chunk size.
    #[inline]
    pub const fn count(value: usize) -> Self {
        Self::Return(value as u32)
    }

    /// Check whether the calling process survives this outcome.
    #[inline]
    pub const fn resumes_caller(&self) -> bool {
        matches!(self, Self::Return(_) | Self::Done)
    }
}

impl FaultPolicy {
    /// Resolve a bad pointer argument under this policy.
    #[inline]
    pub const fn resolve(self) -> Outcome {
        match self {
            Self::Terminate => Outcome::KILL,
            Self::Fail(word) => Outcome::Return(word),
        }
    }
}
