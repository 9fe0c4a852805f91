//! Call Frame Reader
//!
//! A user program places the selector and its arguments on its own stack
//! and raises the system call vector. The saved user stack pointer is the
//! frame base:
//!
//! ```text
//! esp + 0   selector
//! esp + 4   arg0
//! esp + 8   arg1
//! esp + 12  arg2
//! ```
//!
//! Every word is fetched with [`read_word`], which range-checks all four
//! bytes and reports failure as a tagged [`Fault`].

use crate::config::WORD_SIZE;
use crate::mm::{read_word, Fault, UserAddr, UserMemory};

/// The argument block of one boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    base: UserAddr,
}

impl CallFrame {
    /// Accept a saved user stack pointer as a frame base.
    ///
    /// The base itself must be a non-null user address; nothing is read yet.
    pub fn new(esp: u32) -> Result<Self, Fault> {
        let base = UserAddr::new(esp);
        if base.is_null() {
            return Err(Fault::Null);
        }
        if !base.is_user() {
            return Err(Fault::OutOfRange(base));
        }
        Ok(Self { base })
    }

    /// Frame base address.
    #[inline]
    pub const fn base(&self) -> UserAddr {
        self.base
    }

    /// Read the operation selector (word 0).
    pub fn selector<M: UserMemory + ?Sized>(&self, mem: &M) -> Result<u32, Fault> {
        read_word(mem, self.base)
    }

    /// Read argument `index` (word `index + 1`, offset `4 * (index + 1)`).
    pub fn arg<M: UserMemory + ?Sized>(&self, mem: &M, index: usize) -> Result<u32, Fault> {
        let offset = (index as u32)
            .checked_add(1)
            .and_then(|word| word.checked_mul(WORD_SIZE))
            .ok_or(Fault::OutOfRange(self.base))?;
        let addr = self
            .base
            .checked_add(offset)
            .ok_or(Fault::OutOfRange(self.base))?;
        read_word(mem, addr)
    }
}
