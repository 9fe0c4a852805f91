//! Sysgate - System Call Boundary for a 32-bit Teaching Kernel
//!
//! The layer every user request passes through on its way into the kernel.
//! It takes a raw, attacker-controlled call frame, decodes it without ever
//! trusting a user pointer, dispatches to the right kernel service, and
//! writes the result back (or terminates the caller).
//!
//! # Security Features
//! - Range checks on the whole span of every user access
//! - Fault-contained probes: a bad pointer is an error value, not a crash
//! - Tagged results instead of sentinel values
//! - Declarative operation table with per-operation fault policy
//! - Per-process descriptor tables, closed on every termination
//! - Kernel bounce buffers scrubbed after use
//!
//! # Architecture
//! - Target: i386 (32-bit user pointers, `int $0x30` entry)
//! - Scheduler, loader, file system and console are kernel services
//!   reached through the traits in [`services`]

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod exception;
pub mod logger;
pub mod mm;
pub mod security;
pub mod services;
pub mod syscall;

#[cfg(test)]
mod testing;

pub use exception::IntrFrame;
pub use mm::{Fault, UserAddr, UserMemory};
pub use services::{Console, FileSystem, InterruptRegistry, IntrLevel, Pid, ProcessLifecycle};
pub use syscall::{Dispatcher, Outcome, ProcessContext};
