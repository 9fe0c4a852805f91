//! User Virtual Address Type
//!
//! Type-safe wrapper for addresses supplied by user programs. A `UserAddr`
//! carries no trust: it is only a number until one of the predicates below
//! has placed it inside the user half of the address space.
//!
//! # Address Space Split (32-bit)
//! ```text
//! 0x0000_0000            null, never accessible
//! 0x0000_0001 ..         user space
//! PHYS_BASE (0xC000_0000) .. 0xFFFF_FFFF   kernel space
//! ```

use core::fmt;

pub use crate::config::PHYS_BASE;

/// An untrusted user-space virtual address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct UserAddr(u32);

impl UserAddr {
    /// Null address.
    pub const NULL: Self = Self(0);

    /// Wrap a raw address taken from a register or a call frame word.
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Check for the null address.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if the address lies below the kernel split.
    ///
    /// This does not reject null; callers test [`UserAddr::is_null`] first.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 < PHYS_BASE
    }

    /// Check if the address is a non-null user address.
    #[inline]
    pub const fn is_valid_user(self) -> bool {
        !self.is_null() && self.is_user()
    }

    /// Add a byte offset, returning `None` on 32-bit overflow.
    #[inline]
    pub const fn checked_add(self, offset: u32) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Check that every byte of `[self, self + len)` is a valid user address.
    ///
    /// Both the first and the last byte are tested, so a span that starts
    /// in user space and runs into the kernel is rejected. An empty span is
    /// always accepted.
    #[inline]
    pub const fn span_is_user(self, len: u32) -> bool {
        if len == 0 {
            return true;
        }
        if !self.is_valid_user() {
            return false;
        }
        match self.0.checked_add(len - 1) {
            Some(last) => last < PHYS_BASE,
            None => false,
        }
    }
}

impl fmt::Debug for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddr({:#010x})", self.0)
    }
}

impl fmt::Display for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for UserAddr {
    fn from(addr: u32) -> Self {
        Self::new(addr)
    }
}
