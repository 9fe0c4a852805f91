//! System Call Buffer Validation
//!
//! Validates `(pointer, length)` argument pairs before any byte is touched.
//!
//! # Security Principles
//! - Validate the whole span: first and last byte must both be user memory
//! - Fail-secure: a wrapped or straddling span is rejected
//! - Copy through kernel buffers with per-byte fault-contained access
//!   (no slices are ever formed over user memory)

use crate::mm::{read_byte, write_byte, Fault, UserAddr, UserMemory};

/// A user-space buffer whose entire span passed the range check.
///
/// This type guarantees that:
/// - `len == 0`, or the base is non-null and user-space
/// - `base + len - 1` does not overflow and is user-space
///
/// It does not guarantee the pages are mapped; every access still goes
/// through a probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserBuffer {
    base: UserAddr,
    len: u32,
}

impl UserBuffer {
    /// Start of the buffer.
    #[inline]
    pub const fn base(&self) -> UserAddr {
        self.base
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Check for an empty buffer.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    // Offset must be < len; validation guarantees no overflow.
    #[inline]
    fn at(&self, offset: usize) -> UserAddr {
        UserAddr::new(self.base.as_u32() + offset as u32)
    }

    /// Copy the first `min(dst.len(), self.len())` bytes into `dst`.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_in<M: UserMemory + ?Sized>(&self, mem: &M, dst: &mut [u8]) -> Result<usize, Fault> {
        let count = dst.len().min(self.len as usize);
        for (offset, byte) in dst[..count].iter_mut().enumerate() {
            *byte = read_byte(mem, self.at(offset))?;
        }
        Ok(count)
    }

    /// Copy `src` to the start of the buffer.
    ///
    /// `src` longer than the buffer is a caller bug; the excess is dropped.
    pub fn copy_out<M: UserMemory + ?Sized>(&self, mem: &mut M, src: &[u8]) -> Result<(), Fault> {
        let count = src.len().min(self.len as usize);
        for (offset, &byte) in src[..count].iter().enumerate() {
            write_byte(mem, self.at(offset), byte)?;
        }
        Ok(())
    }

    /// Check that the first `count` bytes can be stored to.
    ///
    /// Each byte is read and written back unchanged, so the buffer's
    /// contents are untouched when this succeeds.
    pub fn probe_writable<M: UserMemory + ?Sized>(
        &self,
        mem: &mut M,
        count: usize,
    ) -> Result<(), Fault> {
        let count = count.min(self.len as usize);
        for offset in 0..count {
            let addr = self.at(offset);
            let byte = read_byte(mem, addr)?;
            write_byte(mem, addr, byte)?;
        }
        Ok(())
    }
}

/// Validate a user-space buffer.
///
/// # Security Checks
/// 1. Zero length is always valid
/// 2. Pointer is non-null
/// 3. Pointer is within user space
/// 4. `ptr + len - 1` doesn't overflow and is within user space
pub fn validate_user_buffer(ptr: u32, len: u32) -> Result<UserBuffer, Fault> {
    let base = UserAddr::new(ptr);

    if len == 0 {
        return Ok(UserBuffer { base, len: 0 });
    }

    if base.is_null() {
        return Err(Fault::Null);
    }

    if !base.span_is_user(len) {
        return Err(Fault::OutOfRange(base));
    }

    Ok(UserBuffer { base, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PHYS_BASE;
    use crate::testing::SimMemory;

    #[test]
    fn test_zero_length() {
        assert!(validate_user_buffer(0x0804_8000, 0).is_ok());
        assert!(validate_user_buffer(0, 0).is_ok());
        assert!(validate_user_buffer(PHYS_BASE + 4, 0).is_ok());
    }

    #[test]
    fn test_null_pointer() {
        assert_eq!(validate_user_buffer(0, 100), Err(Fault::Null));
    }

    #[test]
    fn test_overflow() {
        assert!(validate_user_buffer(0xBFFF_FFF0, u32::MAX - 4).is_err());
    }

    #[test]
    fn test_straddling_end_rejected() {
        // Start is valid user memory, last byte is the first kernel byte.
        let ptr = PHYS_BASE - 10;
        assert!(validate_user_buffer(ptr, 10).is_ok());
        assert_eq!(
            validate_user_buffer(ptr, 11),
            Err(Fault::OutOfRange(UserAddr::new(ptr)))
        );
    }

    #[test]
    fn test_kernel_start_rejected() {
        assert!(validate_user_buffer(PHYS_BASE, 1).is_err());
    }

    #[test]
    fn test_copy_in_stops_at_fault() {
        let mut mem = SimMemory::new();
        mem.map(0x3000, 0x1000);
        mem.poke(0x3FFE, b"ab");
        let buf = validate_user_buffer(0x3FFE, 4).unwrap();
        let mut dst = [0u8; 4];
        assert_eq!(
            buf.copy_in(&mem, &mut dst),
            Err(Fault::Unmapped(UserAddr::new(0x4000)))
        );
        assert_eq!(buf.probe_writable(&mut mem, 2), Ok(()));
        assert_eq!(mem.peek(0x3FFE, 2), b"ab");
    }

    #[test]
    fn test_read_only_buffer_not_writable() {
        let mut mem = SimMemory::new();
        mem.map(0x3000, 0x1000);
        mem.poke(0x3100, b"keep");
        mem.protect(0x3100, 4);
        let buf = validate_user_buffer(0x3100, 4).unwrap();

        let mut dst = [0u8; 4];
        assert_eq!(buf.copy_in(&mem, &mut dst), Ok(4));
        assert_eq!(
            buf.probe_writable(&mut mem, 4),
            Err(Fault::Unmapped(UserAddr::new(0x3100)))
        );
        assert_eq!(mem.peek(0x3100, 4), b"keep");
    }

    #[test]
    fn test_copy_out_and_back() {
        let mut mem = SimMemory::new();
        mem.map(0x3000, 0x1000);
        let buf = validate_user_buffer(0x3100, 5).unwrap();
        buf.copy_out(&mut mem, b"hello").unwrap();
        let mut dst = [0u8; 8];
        assert_eq!(buf.copy_in(&mem, &mut dst), Ok(5));
        assert_eq!(&dst[..5], b"hello");
    }
}
