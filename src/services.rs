//! Kernel Services Reached Through the Boundary
//!
//! The dispatcher never touches the scheduler, the file system or the
//! console directly. It calls these traits, and the kernel supplies the
//! implementations. Each trait is as narrow as the system calls need.

use core::fmt;

/// Process identifier as seen by user programs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Wrap a raw process id (the value `exec` returns to user mode).
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw id.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process lifecycle manager.
pub trait ProcessLifecycle {
    /// Record `status` as the exit status of `current` and tear it down.
    ///
    /// In the kernel this does not return to the calling user context.
    /// The dispatcher has already closed every descriptor of `current`.
    fn terminate(&mut self, current: Pid, status: i32);

    /// Load and start a program from a command line. `None` if loading fails.
    fn spawn(&mut self, command_line: &[u8]) -> Option<Pid>;

    /// Block until child `pid` exits and return its status, or -1 if `pid`
    /// is not a child of the caller or has already been waited for.
    fn await_child(&mut self, pid: Pid) -> i32;

    /// Power the machine off.
    fn halt_machine(&mut self);
}

/// File system store.
///
/// File objects are owned values: a descriptor table holds them between
/// calls and hands them back through [`FileSystem::close`].
pub trait FileSystem {
    /// An open file.
    type File;

    /// Create a file of `initial_size` zero bytes.
    fn create(&mut self, name: &[u8], initial_size: u32) -> bool;

    /// Delete a file by name.
    fn remove(&mut self, name: &[u8]) -> bool;

    /// Open a file by name.
    fn open(&mut self, name: &[u8]) -> Option<Self::File>;

    /// Release an open file.
    fn close(&mut self, file: Self::File);

    /// Read at the current position into `dst`; returns bytes read.
    fn read(&mut self, file: &mut Self::File, dst: &mut [u8]) -> usize;

    /// Write `src` at the current position; returns bytes written.
    fn write(&mut self, file: &mut Self::File, src: &[u8]) -> usize;

    /// Move the current position.
    fn seek(&mut self, file: &mut Self::File, pos: u32);

    /// Current position.
    fn tell(&self, file: &Self::File) -> u32;

    /// File length in bytes.
    fn length(&self, file: &Self::File) -> u32;
}

/// Standard output.
pub trait Console {
    /// Emit raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Interrupt state while a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrLevel {
    /// External interrupts stay masked.
    Off,
    /// External interrupts are enabled during the handler.
    On,
}

/// Interrupt descriptor table owner.
pub trait InterruptRegistry {
    /// Install the handler for a software interrupt `vector` that code at
    /// privilege `dpl` may raise.
    fn register(&mut self, vector: u8, dpl: u8, level: IntrLevel, name: &'static str);
}
