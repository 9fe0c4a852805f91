//! Boundary Configuration
//!
//! Compile-time limits shared by the user-memory primitives, the descriptor
//! table and the dispatcher. The user-mode runtime is built against the same
//! values.

/// First kernel virtual address. User addresses live in `[1, PHYS_BASE)`.
pub const PHYS_BASE: u32 = 0xC000_0000;

/// Descriptor slots per process.
pub const FD_TABLE_SIZE: usize = 128;

/// Descriptor number of standard input.
pub const STDIN_FD: u32 = 0;

/// Descriptor number of standard output.
pub const STDOUT_FD: u32 = 1;

/// First descriptor handed out by `open`.
pub const FIRST_FILE_FD: u32 = 2;

/// Capacity of an extracted path, including the terminating NUL.
pub const MAX_PATH: usize = 256;

/// Maximum bytes copied from user memory per `write` call.
pub const WRITE_CHUNK: usize = 256;

/// Maximum bytes transferred into user memory per `read` call.
pub const READ_CHUNK: usize = 512;

/// Software interrupt vector reserved for system calls.
pub const SYSCALL_VECTOR: u8 = 0x30;

/// Descriptor privilege level allowed to raise [`SYSCALL_VECTOR`].
pub const SYSCALL_DPL: u8 = 3;

/// Exit status recorded when the boundary kills a process.
pub const ABNORMAL_EXIT: i32 = -1;

/// Size in bytes of one call frame word.
pub const WORD_SIZE: u32 = 4;

/// Largest number of argument words any operation consumes.
pub const MAX_ARGS: usize = 3;
