//! System Call Interface
//!
//! The trusted boundary between user programs and the kernel.
//!
//! # Security Model
//! - Whitelist approach: only selectors in the operation table are served;
//!   anything else terminates the caller
//! - Every argument word and pointer is range-checked and read through
//!   fault-contained probes
//! - Bad pointers are handled per operation (terminate or return -1), bad
//!   handles always return an error
//! - The kernel never panics on user input
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(path, initial_size) -> bool
//! - 5: remove(path) -> bool
//! - 6: open(path) -> fd
//! - 7: filesize(fd) -> bytes
//! - 8: read(fd, buf, len) -> bytes
//! - 9: write(fd, buf, len) -> bytes
//! - 10: seek(fd, pos)
//! - 11: tell(fd) -> pos
//! - 12: close(fd)

mod cstr;
mod fd;
mod frame;
mod handler;
mod policy;
mod table;
mod validate;

pub use cstr::{extract_cstring, PathString, UserString};
pub use fd::{Fd, FdError, FdTable, TableFull};
pub use frame::CallFrame;
pub use handler::{Dispatcher, ProcessContext};
pub use policy::{Outcome, ERROR_WORD};
pub use table::{lookup, Arg, FaultPolicy, OpFlags, OpSpec, Selector, OPERATIONS};
pub use validate::{validate_user_buffer, UserBuffer};
