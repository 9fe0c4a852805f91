//! System Call Dispatcher
//!
//! Decodes a call frame against the operation table, runs the operation
//! against the caller's descriptor table or a kernel service, and delivers
//! the outcome.
//!
//! One crossing moves through
//! `SelectorRead -> ArgumentsDecoded -> Executed -> ResultDelivered | Terminated`
//! and keeps no state afterwards.
//!
//! # Security Considerations
//! - The frame base and every argument word are range-checked before use
//! - Unknown selectors terminate the caller (fail-closed)
//! - Pointer arguments are validated while decoding, before any side effect
//! - Bad handles (fd, pid) are recoverable errors, never terminations

use super::cstr::{extract_cstring, PathString};
use super::fd::FdTable;
use super::frame::CallFrame;
use super::policy::Outcome;
use super::table::{self, Arg, OpFlags, OpSpec, Selector};
use super::validate::{validate_user_buffer, UserBuffer};
use crate::config::{MAX_ARGS, READ_CHUNK, STDIN_FD, STDOUT_FD, WRITE_CHUNK};
use crate::exception::IntrFrame;
use crate::mm::{Fault, UserMemory};
use crate::security::Scrubbed;
use crate::services::{Console, FileSystem, Pid, ProcessLifecycle};

/// The acting process, threaded explicitly into every crossing.
pub struct ProcessContext<F> {
    pid: Pid,
    fds: FdTable<F>,
}

impl<F> ProcessContext<F> {
    /// Context for a freshly started process with no open files.
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            fds: FdTable::new(),
        }
    }

    /// Identity of the process.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The process's descriptor table.
    #[inline]
    pub fn fds(&self) -> &FdTable<F> {
        &self.fds
    }

    /// The process's descriptor table, mutably.
    #[inline]
    pub fn fds_mut(&mut self) -> &mut FdTable<F> {
        &mut self.fds
    }
}

/// Decoded arguments of one crossing.
struct Args {
    words: [u32; MAX_ARGS],
    path: Option<PathString>,
    buffer: Option<UserBuffer>,
}

impl Args {
    #[inline]
    fn word(&self, index: usize) -> u32 {
        self.words[index]
    }

    // Present whenever the table declares the argument; decode fills it.
    #[inline]
    fn path(&self) -> &[u8] {
        debug_assert!(self.path.is_some(), "path argument not decoded");
        match &self.path {
            Some(path) => path.as_bytes(),
            None => &[],
        }
    }

    #[inline]
    fn buffer(&self) -> UserBuffer {
        debug_assert!(self.buffer.is_some(), "buffer argument not decoded");
        self.buffer.unwrap_or_default()
    }
}

/// The system call boundary.
///
/// Owns handles to the user memory probe and the kernel services. The
/// acting process is passed to each call.
pub struct Dispatcher<M, P, S, C> {
    /// Fault-contained access to the caller's address space.
    pub mem: M,
    /// Process lifecycle manager.
    pub procs: P,
    /// File system store.
    pub fs: S,
    /// Standard output.
    pub console: C,
}

impl<M, P, S, C> Dispatcher<M, P, S, C>
where
    M: UserMemory,
    P: ProcessLifecycle,
    S: FileSystem,
    C: Console,
{
    /// Assemble a dispatcher from its services.
    pub fn new(mem: M, procs: P, fs: S, console: C) -> Self {
        Self {
            mem,
            procs,
            fs,
            console,
        }
    }

    /// Trap entry for the system call vector.
    ///
    /// Dispatches the request found at the saved user stack pointer and
    /// applies the outcome: the result word goes to `eax`, a termination
    /// closes every descriptor and hands the process to the lifecycle
    /// manager, and a halt powers off.
    pub fn handle(&mut self, ctx: &mut ProcessContext<S::File>, frame: &mut IntrFrame) -> Outcome {
        let outcome = self.dispatch(ctx, frame.esp);

        match outcome {
            Outcome::Return(word) => frame.eax = word,
            Outcome::Done => {}
            Outcome::Terminate(status) => self.terminate(ctx, status),
            Outcome::Halt => {
                log::info!("[SYSCALL] halt requested by {}", ctx.pid);
                self.procs.halt_machine();
            }
        }

        outcome
    }

    /// Decode and execute one request without applying the outcome.
    pub fn dispatch(&mut self, ctx: &mut ProcessContext<S::File>, esp: u32) -> Outcome {
        let frame = match CallFrame::new(esp) {
            Ok(frame) => frame,
            Err(fault) => {
                log::warn!("[SYSCALL] {}: bad frame base: {}", ctx.pid, fault);
                return Outcome::KILL;
            }
        };

        let raw = match frame.selector(&self.mem) {
            Ok(raw) => raw,
            Err(fault) => {
                log::warn!("[SYSCALL] {}: unreadable selector: {}", ctx.pid, fault);
                return Outcome::KILL;
            }
        };

        let Some(op) = table::lookup(raw) else {
            log::warn!("[SYSCALL] {}: unknown system call {}", ctx.pid, raw);
            return Outcome::KILL;
        };

        let args = match self.decode(ctx.pid, &frame, op) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };

        log::trace!(
            "[SYSCALL] {}: {}({:#x}, {:#x}, {:#x})",
            ctx.pid,
            op.name,
            args.words[0],
            args.words[1],
            args.words[2]
        );
        if op.flags.contains(OpFlags::MAY_BLOCK) {
            log::trace!("[SYSCALL] {}: {} may block", ctx.pid, op.name);
        }
        if op.flags.contains(OpFlags::USES_FDS) {
            log::trace!(
                "[FD] {}: {} with {} descriptor(s) open",
                ctx.pid,
                op.name,
                ctx.fds.open_count()
            );
        }

        let outcome = self.execute(ctx, op, &args);

        debug_assert!(
            !op.flags.contains(OpFlags::NO_RETURN) || !outcome.resumes_caller(),
            "{} resumed its caller",
            op.name
        );
        debug_assert!(
            !outcome.resumes_caller()
                || op.returns_value() == matches!(outcome, Outcome::Return(_)),
            "{} result slot mismatch",
            op.name
        );

        outcome
    }

    /// Read every argument word the entry declares, then validate pointer
    /// arguments under the entry's policy.
    fn decode(&self, pid: Pid, frame: &CallFrame, op: &OpSpec) -> Result<Args, Outcome> {
        let mut words = [0u32; MAX_ARGS];
        for (index, word) in words.iter_mut().enumerate().take(op.arg_words()) {
            *word = frame.arg(&self.mem, index).map_err(|fault| {
                log::warn!("[SYSCALL] {}: {} argument {}: {}", pid, op.name, index, fault);
                Outcome::KILL
            })?;
        }

        let mut args = Args {
            words,
            path: None,
            buffer: None,
        };

        let mut index = 0;
        for arg in op.args {
            match arg {
                Arg::Value => {}
                Arg::Path => {
                    let path = extract_cstring(&self.mem, words[index])
                        .map_err(|fault| Self::reject(pid, op, fault))?;
                    args.path = Some(path);
                }
                Arg::Buffer => {
                    let buffer = validate_user_buffer(words[index], words[index + 1])
                        .map_err(|fault| Self::reject(pid, op, fault))?;
                    args.buffer = Some(buffer);
                }
            }
            index += arg.words();
        }

        Ok(args)
    }

    fn reject(pid: Pid, op: &OpSpec, fault: Fault) -> Outcome {
        log::warn!(
            "[SYSCALL] {}: {} bad pointer ({}), policy {:?}",
            pid,
            op.name,
            fault,
            op.on_bad_pointer
        );
        op.on_bad_pointer.resolve()
    }

    fn execute(&mut self, ctx: &mut ProcessContext<S::File>, op: &OpSpec, args: &Args) -> Outcome {
        match op.selector {
            Selector::Halt => Outcome::Halt,
            Selector::Exit => Outcome::Terminate(args.word(0) as i32),
            Selector::Exec => self.sys_exec(args.path()),
            Selector::Wait => self.sys_wait(args.word(0)),
            Selector::Create => Outcome::boolean(self.fs.create(args.path(), args.word(1))),
            Selector::Remove => Outcome::boolean(self.fs.remove(args.path())),
            Selector::Open => self.sys_open(ctx, args.path()),
            Selector::Filesize => self.sys_filesize(ctx, args.word(0)),
            Selector::Read => self.sys_read(ctx, op, args.word(0), args.buffer()),
            Selector::Write => self.sys_write(ctx, op, args.word(0), args.buffer()),
            Selector::Seek => self.sys_seek(ctx, args.word(0), args.word(1)),
            Selector::Tell => self.sys_tell(ctx, args.word(0)),
            Selector::Close => self.sys_close(ctx, args.word(0)),
        }
    }

    /// Close the process's files, then hand it to the lifecycle manager.
    fn terminate(&mut self, ctx: &mut ProcessContext<S::File>, status: i32) {
        let closed = ctx.fds.release_all(&mut self.fs);
        log::info!(
            "[PROCESS] {}: exit({}), {} descriptor(s) closed",
            ctx.pid,
            status,
            closed
        );
        self.procs.terminate(ctx.pid, status);
    }

    fn sys_exec(&mut self, command_line: &[u8]) -> Outcome {
        match self.procs.spawn(command_line) {
            Some(child) => Outcome::signed(child.as_i32()),
            None => Outcome::FAILURE,
        }
    }

    fn sys_wait(&mut self, pid: u32) -> Outcome {
        Outcome::signed(self.procs.await_child(Pid::new(pid as i32)))
    }

    fn sys_open(&mut self, ctx: &mut ProcessContext<S::File>, name: &[u8]) -> Outcome {
        let Some(file) = self.fs.open(name) else {
            return Outcome::FAILURE;
        };

        match ctx.fds.allocate(file) {
            Ok(fd) => {
                log::debug!("[FD] {}: open -> {}", ctx.pid, fd.as_u32());
                Outcome::Return(fd.as_u32())
            }
            Err(full) => {
                log::debug!("[FD] {}: table full, closing file", ctx.pid);
                self.fs.close(full.into_inner());
                Outcome::FAILURE
            }
        }
    }

    fn sys_filesize(&mut self, ctx: &ProcessContext<S::File>, fd: u32) -> Outcome {
        match ctx.fds.lookup(fd) {
            Ok(file) => Outcome::Return(self.fs.length(file)),
            Err(_) => Outcome::FAILURE,
        }
    }

    fn sys_read(
        &mut self,
        ctx: &mut ProcessContext<S::File>,
        op: &OpSpec,
        fd: u32,
        buffer: UserBuffer,
    ) -> Outcome {
        if fd == STDIN_FD {
            log::debug!("[FD] {}: read from stdin is not supported", ctx.pid);
            return Outcome::FAILURE;
        }

        let file = match ctx.fds.lookup_mut(fd) {
            Ok(file) => file,
            Err(err) => {
                log::debug!("[FD] {}: read({}): {}", ctx.pid, fd, err);
                return Outcome::FAILURE;
            }
        };

        let wanted = (buffer.len() as usize).min(READ_CHUNK);

        // Decide termination before the file offset moves.
        if let Err(fault) = buffer.probe_writable(&mut self.mem, wanted) {
            return Self::reject(ctx.pid, op, fault);
        }

        let mut bounce = Scrubbed::<[u8; READ_CHUNK]>::zeroed();
        let read = self.fs.read(file, &mut bounce[..wanted]).min(wanted);

        if let Err(fault) = buffer.copy_out(&mut self.mem, &bounce[..read]) {
            return Self::reject(ctx.pid, op, fault);
        }
        Outcome::count(read)
    }

    fn sys_write(
        &mut self,
        ctx: &mut ProcessContext<S::File>,
        op: &OpSpec,
        fd: u32,
        buffer: UserBuffer,
    ) -> Outcome {
        let mut bounce = Scrubbed::<[u8; WRITE_CHUNK]>::zeroed();

        if fd == STDOUT_FD {
            let copied = match buffer.copy_in(&self.mem, &mut bounce[..]) {
                Ok(copied) => copied,
                Err(fault) => return Self::reject(ctx.pid, op, fault),
            };
            if copied > 0 {
                self.console.write_bytes(&bounce[..copied]);
            }
            return Outcome::count(copied);
        }

        let file = match ctx.fds.lookup_mut(fd) {
            Ok(file) => file,
            Err(err) => {
                log::debug!("[FD] {}: write({}): {}", ctx.pid, fd, err);
                return Outcome::FAILURE;
            }
        };

        let copied = match buffer.copy_in(&self.mem, &mut bounce[..]) {
            Ok(copied) => copied,
            Err(fault) => return Self::reject(ctx.pid, op, fault),
        };
        Outcome::count(self.fs.write(file, &bounce[..copied]).min(copied))
    }

    fn sys_seek(&mut self, ctx: &mut ProcessContext<S::File>, fd: u32, pos: u32) -> Outcome {
        if let Ok(file) = ctx.fds.lookup_mut(fd) {
            self.fs.seek(file, pos);
        }
        Outcome::Done
    }

    fn sys_tell(&mut self, ctx: &ProcessContext<S::File>, fd: u32) -> Outcome {
        match ctx.fds.lookup(fd) {
            Ok(file) => Outcome::Return(self.fs.tell(file)),
            Err(_) => Outcome::FAILURE,
        }
    }

    fn sys_close(&mut self, ctx: &mut ProcessContext<S::File>, fd: u32) -> Outcome {
        match ctx.fds.release(fd, &mut self.fs) {
            Ok(()) => log::debug!("[FD] {}: close({})", ctx.pid, fd),
            Err(err) => log::debug!("[FD] {}: close({}): {}", ctx.pid, fd, err),
        }
        Outcome::Done
    }
}
