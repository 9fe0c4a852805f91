//! Bounce Buffer Scrubbing
//!
//! Data copied between user memory and the file system passes through
//! kernel stack buffers. Those buffers are zeroed when the system call
//! finishes so one process's file contents never linger where a later
//! crossing could observe them.
//!
//! # Design
//! - `Zeroize` trait for byte storage that can be cleared
//! - `Scrubbed<T>` RAII wrapper that clears on drop
//! - Volatile writes keep the compiler from eliding the clear

use core::ops::{Deref, DerefMut};
use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};

/// Storage that can be overwritten with zeros.
pub trait Zeroize {
    /// Overwrite every byte with zero. Must not be optimized away.
    fn zeroize(&mut self);
}

impl Zeroize for [u8] {
    fn zeroize(&mut self) {
        for byte in self.iter_mut() {
            // SAFETY: `byte` is a valid, aligned, exclusive reference
            unsafe {
                ptr::write_volatile(byte, 0);
            }
        }
        compiler_fence(Ordering::SeqCst);
    }
}

impl<const N: usize> Zeroize for [u8; N] {
    fn zeroize(&mut self) {
        self.as_mut_slice().zeroize();
    }
}

/// A value that is zeroed when dropped.
#[derive(Debug)]
pub struct Scrubbed<T: Zeroize> {
    inner: T,
}

impl<T: Zeroize> Scrubbed<T> {
    /// Wrap `value`.
    #[inline]
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }
}

impl<const N: usize> Scrubbed<[u8; N]> {
    /// A zero-filled byte buffer of `N` bytes.
    #[inline]
    pub fn zeroed() -> Self {
        Self::new([0; N])
    }
}

impl<T: Zeroize> Deref for Scrubbed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Zeroize> DerefMut for Scrubbed<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Zeroize> Drop for Scrubbed<T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroize_slice() {
        let mut data = [0x42u8; 16];
        data[..8].zeroize();
        assert!(data[..8].iter().all(|&b| b == 0));
        assert!(data[8..].iter().all(|&b| b == 0x42));
    }

    #[test]
    fn test_scrubbed_derefs_to_buffer() {
        let mut buf = Scrubbed::<[u8; 4]>::zeroed();
        buf[1] = 9;
        assert_eq!(&buf[..], &[0, 9, 0, 0]);
        buf.zeroize();
        assert_eq!(&buf[..], &[0; 4]);
    }
}
