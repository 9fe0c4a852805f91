//! i386 Trap Frame and Fault Containment
//!
//! The trap entry stub pushes an [`IntrFrame`] and calls into Rust. Two
//! vectors matter to the boundary:
//!
//! - `0x30` (system call): raised by user code with `int $0x30`, handled by
//!   [`crate::syscall::Dispatcher::handle`] with interrupts enabled
//! - `0x0E` (page fault): a fault taken in kernel mode while probing user
//!   memory is turned into a failure return by [`contain_kernel_fault`]
//!
//! # Security Considerations
//! - Only kernel-mode faults are contained; a user-mode fault is the page
//!   fault handler's business (it kills the process)
//! - The syscall vector is the only one reachable from privilege level 3

use bitflags::bitflags;

use crate::config::{SYSCALL_DPL, SYSCALL_VECTOR};
use crate::services::{InterruptRegistry, IntrLevel};

/// Kernel code segment selector.
pub const SEL_KCSEG: u32 = 0x08;

/// User code segment selector (RPL 3).
pub const SEL_UCSEG: u32 = 0x1B;

/// Page fault vector.
pub const PAGE_FAULT_VECTOR: u32 = 0x0E;

/// Interrupt frame saved on the kernel stack by the entry stub.
///
/// Segment registers are stored as 32-bit slots (16-bit value plus padding).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrFrame {
    // Pushed by `pushal`.
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub esp_dummy: u32,
    pub ebx: u32,
    pub edx: u32,
    /// Second scratch register.
    pub ecx: u32,
    /// Return value slot, and the probe continuation address.
    pub eax: u32,

    pub gs: u32,
    pub fs: u32,
    pub es: u32,
    pub ds: u32,

    /// Vector number.
    pub vec_no: u32,
    /// CPU error code (page fault code for vector 0x0E).
    pub error_code: u32,
    pub frame_pointer: u32,

    // Pushed by the CPU.
    /// Faulting or next instruction.
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    /// Saved user stack pointer; base of the call frame.
    pub esp: u32,
    pub ss: u32,
}

impl IntrFrame {
    /// Frame for a user-mode `int $0x30` with stack pointer `esp`.
    pub fn syscall(esp: u32) -> Self {
        Self {
            vec_no: SYSCALL_VECTOR as u32,
            cs: SEL_UCSEG,
            esp,
            ..Self::default()
        }
    }

    /// Check whether the trap was taken from privilege level 3.
    #[inline]
    pub const fn from_user(&self) -> bool {
        self.cs & 3 == 3
    }
}

bitflags! {
    /// Page fault error code bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFaultCode: u32 {
        /// 0: not-present page. 1: rights violation.
        const PRESENT = 1 << 0;
        /// 0: read. 1: write.
        const WRITE = 1 << 1;
        /// 0: kernel mode. 1: user mode.
        const USER = 1 << 2;
    }
}

/// Convert a kernel-mode page fault into a probe failure.
///
/// The user memory probes load their continuation address into `eax`
/// before the access. On a kernel-mode fault, resume there with
/// `eax = 0xFFFF_FFFF` and report `true`. User-mode faults are left alone
/// and `false` is returned.
pub fn contain_kernel_fault(frame: &mut IntrFrame) -> bool {
    let code = PageFaultCode::from_bits_truncate(frame.error_code);
    if code.contains(PageFaultCode::USER) {
        return false;
    }

    log::trace!(
        "[FAULT] contained kernel {} fault at eip {:#010x}",
        if code.contains(PageFaultCode::WRITE) { "write" } else { "read" },
        frame.eip
    );
    frame.eip = frame.eax;
    frame.eax = u32::MAX;
    true
}

/// Install the system call vector.
///
/// Interrupts stay enabled while the handler runs so a blocking operation
/// (wait, exec) does not stall the rest of the machine.
pub fn init<R: InterruptRegistry + ?Sized>(registry: &mut R) {
    registry.register(SYSCALL_VECTOR, SYSCALL_DPL, IntrLevel::On, "syscall");
    log::info!(
        "[BOOT] System call vector {:#04x} installed (dpl {})",
        SYSCALL_VECTOR,
        SYSCALL_DPL
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimRegistry;

    #[test]
    fn test_kernel_fault_is_contained() {
        let mut frame = IntrFrame {
            vec_no: PAGE_FAULT_VECTOR,
            error_code: PageFaultCode::WRITE.bits(),
            cs: SEL_KCSEG,
            eip: 0xC010_2000,
            eax: 0xC010_2008,
            ..IntrFrame::default()
        };
        assert!(contain_kernel_fault(&mut frame));
        assert_eq!(frame.eip, 0xC010_2008);
        assert_eq!(frame.eax, u32::MAX);
    }

    #[test]
    fn test_user_fault_is_not_contained() {
        let mut frame = IntrFrame {
            vec_no: PAGE_FAULT_VECTOR,
            error_code: (PageFaultCode::USER | PageFaultCode::PRESENT).bits(),
            cs: SEL_UCSEG,
            eip: 0x0804_8000,
            eax: 5,
            ..IntrFrame::default()
        };
        assert!(!contain_kernel_fault(&mut frame));
        assert_eq!(frame.eip, 0x0804_8000);
        assert_eq!(frame.eax, 5);
    }

    #[test]
    fn test_syscall_frame() {
        let frame = IntrFrame::syscall(0xBFFF_FF00);
        assert!(frame.from_user());
        assert_eq!(frame.vec_no, 0x30);
    }

    #[test]
    fn test_init_registers_user_vector() {
        let mut registry = SimRegistry::default();
        init(&mut registry);
        assert_eq!(
            registry.entries,
            std::vec![(0x30, 3, IntrLevel::On, "syscall")]
        );
    }
}
