//! Fault-Contained User Memory Access
//!
//! Every load or store the kernel performs on behalf of a system call goes
//! through the three primitives in this module.
//!
//! # Security Principles
//! - The range check is the primary defense: no probe is issued for an
//!   address that is null or outside user space.
//! - The probe is defense-in-depth: an address that passes the range check
//!   but is unmapped yields [`Fault::Unmapped`] instead of a kernel crash.
//! - Results are tagged. A word read never uses a magic value to signal
//!   failure, so `0xFFFF_FFFF` is a legitimate argument.

use core::fmt;

use super::address::UserAddr;
use crate::config::WORD_SIZE;

/// Why a user memory access failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The address was null.
    Null,
    /// Some byte of the access lies outside user space (or the span wraps).
    OutOfRange(UserAddr),
    /// The address passed the range check but the probe faulted.
    Unmapped(UserAddr),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null user pointer"),
            Self::OutOfRange(addr) => write!(f, "user access out of range at {}", addr),
            Self::Unmapped(addr) => write!(f, "user access faulted at {}", addr),
        }
    }
}

/// The fault-contained access capability.
///
/// Implementations attempt a single-byte access against the current user
/// address space and report a structured outcome. They must never let a
/// hardware fault escape. Callers only reach an implementation through
/// [`read_byte`], [`read_word`] and [`write_byte`], which have already
/// range-checked the address.
pub trait UserMemory {
    /// Load one byte, or `Err(Fault::Unmapped)` if the access faults.
    fn probe_read(&self, addr: UserAddr) -> Result<u8, Fault>;

    /// Store one byte, or `Err(Fault::Unmapped)` if the access faults.
    fn probe_write(&mut self, addr: UserAddr, value: u8) -> Result<(), Fault>;
}

#[inline]
fn check_byte(addr: UserAddr) -> Result<(), Fault> {
    if addr.is_null() {
        return Err(Fault::Null);
    }
    if !addr.is_user() {
        return Err(Fault::OutOfRange(addr));
    }
    Ok(())
}

/// Read one byte from user memory.
pub fn read_byte<M: UserMemory + ?Sized>(mem: &M, addr: UserAddr) -> Result<u8, Fault> {
    check_byte(addr)?;
    mem.probe_read(addr)
}

/// Read a little-endian 32-bit word from user memory.
///
/// The whole span `[addr, addr + 4)` is range-checked before the first
/// probe, then each byte is probed individually.
pub fn read_word<M: UserMemory + ?Sized>(mem: &M, addr: UserAddr) -> Result<u32, Fault> {
    check_byte(addr)?;
    if !addr.span_is_user(WORD_SIZE) {
        return Err(Fault::OutOfRange(addr));
    }

    let mut bytes = [0u8; WORD_SIZE as usize];
    for (offset, byte) in (0u32..).zip(bytes.iter_mut()) {
        // In range: the span check above covered addr + 3.
        let at = UserAddr::new(addr.as_u32() + offset);
        *byte = mem.probe_read(at)?;
    }
    Ok(u32::from_le_bytes(bytes))
}

/// Write one byte to user memory.
pub fn write_byte<M: UserMemory + ?Sized>(
    mem: &mut M,
    addr: UserAddr,
    value: u8,
) -> Result<(), Fault> {
    check_byte(addr)?;
    mem.probe_write(addr, value)
}
