//! String Extraction
//!
//! Copies a NUL-terminated string out of user memory into a fixed-capacity
//! kernel buffer, one fault-contained byte at a time. The length of the
//! source is unknown, so every byte is range-checked as it is reached.

use core::fmt;

use crate::config::MAX_PATH;
use crate::mm::{read_byte, Fault, UserAddr, UserMemory};

/// A kernel-owned copy of a user string, always NUL-terminated.
///
/// At most `N - 1` bytes of content are kept; longer sources are truncated.
#[derive(Clone)]
pub struct UserString<const N: usize> {
    buf: [u8; N],
    len: usize,
}

/// A path or command line extracted for one system call.
pub type PathString = UserString<MAX_PATH>;

impl<const N: usize> UserString<N> {
    /// Content bytes, without the terminator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Content length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check for an empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> fmt::Debug for UserString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())
    }
}

/// Copy a NUL-terminated string from `ptr` into a `UserString<N>`.
///
/// Copying stops at the first NUL or after `N - 1` bytes, whichever comes
/// first; the result is always terminated. A null or kernel `ptr` is
/// rejected before the first probe, and any fault while copying aborts
/// the extraction.
pub fn extract_cstring<const N: usize, M: UserMemory + ?Sized>(
    mem: &M,
    ptr: u32,
) -> Result<UserString<N>, Fault> {
    debug_assert!(N > 0, "string buffer needs room for the terminator");

    let base = UserAddr::new(ptr);
    if base.is_null() {
        return Err(Fault::Null);
    }
    if !base.is_user() {
        return Err(Fault::OutOfRange(base));
    }

    let mut out = UserString { buf: [0; N], len: 0 };
    while out.len < N - 1 {
        let addr = base
            .checked_add(out.len as u32)
            .ok_or(Fault::OutOfRange(base))?;
        let byte = read_byte(mem, addr)?;
        if byte == 0 {
            break;
        }
        out.buf[out.len] = byte;
        out.len += 1;
    }
    out.buf[out.len] = 0;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PHYS_BASE;
    use crate::testing::SimMemory;

    fn mem_with(addr: u32, bytes: &[u8]) -> SimMemory {
        let mut mem = SimMemory::new();
        mem.map(0x1000, 0x2000);
        mem.poke(addr, bytes);
        mem
    }

    #[test]
    fn test_extracts_until_nul() {
        let mem = mem_with(0x1100, b"echo x\0garbage");
        let s: PathString = extract_cstring(&mem, 0x1100).unwrap();
        assert_eq!(s.as_bytes(), b"echo x");
        assert_eq!(&s.buf[..=s.len], b"echo x\0");
    }

    #[test]
    fn test_empty_string() {
        let mem = mem_with(0x1100, b"\0");
        let s: PathString = extract_cstring(&mem, 0x1100).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_truncates_at_capacity() {
        let mem = mem_with(0x1100, &[b'a'; 400]);
        let s: PathString = extract_cstring(&mem, 0x1100).unwrap();
        assert_eq!(s.len(), MAX_PATH - 1);
        assert_eq!(s.buf[s.len], 0);
    }

    #[test]
    fn test_small_capacity() {
        let mem = mem_with(0x1100, b"abcdef\0");
        let s: UserString<4> = extract_cstring(&mem, 0x1100).unwrap();
        assert_eq!(s.as_bytes(), b"abc");
    }

    #[test]
    fn test_rejects_bad_pointers() {
        let mem = mem_with(0x1100, b"x\0");
        assert_eq!(extract_cstring::<8, _>(&mem, 0).unwrap_err(), Fault::Null);
        assert!(matches!(
            extract_cstring::<8, _>(&mem, PHYS_BASE),
            Err(Fault::OutOfRange(_))
        ));
        assert_eq!(mem.probes(), 0);
    }

    #[test]
    fn test_fault_mid_string() {
        // Unterminated string running off the end of the mapping.
        let mem = mem_with(0x2FFC, b"abcd");
        assert_eq!(
            extract_cstring::<64, _>(&mem, 0x2FFC).unwrap_err(),
            Fault::Unmapped(UserAddr::new(0x3000))
        );
    }

    #[test]
    fn test_string_running_into_kernel() {
        let mut mem = SimMemory::new();
        mem.map(PHYS_BASE - 0x1000, 0x1000);
        mem.poke(PHYS_BASE - 2, b"ab");
        assert_eq!(
            extract_cstring::<64, _>(&mem, PHYS_BASE - 2).unwrap_err(),
            Fault::OutOfRange(UserAddr::new(PHYS_BASE))
        );
    }
}
