//! User memory access for the system call boundary
//!
//! Provides:
//! - The `UserAddr` type and the user/kernel split
//! - Bounds-checked, fault-contained byte and word primitives
//! - The i386 hardware probe (on `x86` targets)
//!
//! # Security Principles
//! - Range-check the entire span before any access
//! - Never let a user-induced fault crash the kernel
//! - Unsafe code is confined to `probe`

pub mod address;
#[cfg(target_arch = "x86")]
pub mod probe;
pub mod uaccess;

pub use address::UserAddr;
#[cfg(target_arch = "x86")]
pub use probe::HardwareProbe;
pub use uaccess::{read_byte, read_word, write_byte, Fault, UserMemory};
