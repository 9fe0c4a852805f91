//! Hardware User Memory Probe (i386)
//!
//! Each probe loads the address of its own continuation label into `eax`
//! before touching user memory. If the access page-faults, the page fault
//! handler ([`crate::exception::contain_kernel_fault`]) resumes execution at
//! that label with `eax = 0xFFFF_FFFF`. The raw value never leaves this
//! module; it is converted to a tagged [`Fault`] immediately.

use core::arch::asm;

use super::address::UserAddr;
use super::uaccess::{Fault, UserMemory};

/// Probes the current page directory's user half.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareProbe;

impl HardwareProbe {
    /// Create a probe for the running address space.
    pub const fn new() -> Self {
        Self
    }
}

impl UserMemory for HardwareProbe {
    fn probe_read(&self, addr: UserAddr) -> Result<u8, Fault> {
        let result: i32;
        // SAFETY:
        // - The caller range-checked `addr` to lie in user space
        // - A fault is redirected to label 2 by the page fault handler
        unsafe {
            asm!(
                "movl $2f, %eax",
                "movzbl ({addr}), %eax",
                "2:",
                addr = in(reg) addr.as_u32(),
                out("eax") result,
                options(att_syntax, nostack, readonly),
            );
        }
        if result < 0 {
            Err(Fault::Unmapped(addr))
        } else {
            Ok(result as u8)
        }
    }

    fn probe_write(&mut self, addr: UserAddr, value: u8) -> Result<(), Fault> {
        let status: i32;
        // SAFETY: same contract as probe_read
        unsafe {
            asm!(
                "movl $2f, %eax",
                "movb {value}, ({addr})",
                "2:",
                addr = in(reg) addr.as_u32(),
                value = in(reg_byte) value,
                out("eax") status,
                options(att_syntax, nostack),
            );
        }
        if status == -1 {
            Err(Fault::Unmapped(addr))
        } else {
            Ok(())
        }
    }
}
