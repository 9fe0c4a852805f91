//! Operation Table
//!
//! One entry per system call, describing how its arguments are decoded and
//! what happens when a user pointer among them is bad. The dispatcher reads
//! this table instead of repeating the decoding in every handler, so the
//! difference between "terminate" and "return an error" is a data field.
//!
//! | Selector | Name | Arguments | Bad pointer |
//! |---|---|---|---|
//! | 0 | halt | - | - |
//! | 1 | exit | status | - |
//! | 2 | exec | path | return -1 |
//! | 3 | wait | pid | - |
//! | 4 | create | path, size | terminate |
//! | 5 | remove | path | terminate |
//! | 6 | open | path | terminate |
//! | 7 | filesize | fd | - |
//! | 8 | read | fd, buffer | terminate |
//! | 9 | write | fd, buffer | return -1 |
//! | 10 | seek | fd, position | - |
//! | 11 | tell | fd | - |
//! | 12 | close | fd | - |

use bitflags::bitflags;

use super::policy::ERROR_WORD;

/// System call selectors (word 0 of the call frame).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Halt = 0,
    Exit = 1,
    Exec = 2,
    Wait = 3,
    Create = 4,
    Remove = 5,
    Open = 6,
    Filesize = 7,
    Read = 8,
    Write = 9,
    Seek = 10,
    Tell = 11,
    Close = 12,
}

impl TryFrom<u32> for Selector {
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            other => return Err(other),
        })
    }
}

/// Shape of one argument in the call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    /// A plain integer (status, pid, fd, size, position). One word.
    Value,
    /// Pointer to a NUL-terminated string. One word.
    Path,
    /// Pointer followed by a byte length. Two words.
    Buffer,
}

impl Arg {
    /// Frame words this argument occupies.
    pub const fn words(self) -> usize {
        match self {
            Self::Value | Self::Path => 1,
            Self::Buffer => 2,
        }
    }
}

/// What the boundary does when a pointer argument is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Kill the calling process with the abnormal exit status.
    Terminate,
    /// Deliver this word as the result and let the process continue.
    Fail(u32),
}

bitflags! {
    /// Static properties of an operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpFlags: u8 {
        /// A result word is written to the return slot.
        const RETURNS_VALUE = 1 << 0;
        /// The caller never resumes (halt, exit).
        const NO_RETURN = 1 << 1;
        /// The collaborator may block the calling context.
        const MAY_BLOCK = 1 << 2;
        /// Operates on the caller's descriptor table.
        const USES_FDS = 1 << 3;
    }
}

/// Declarative description of one system call.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    /// Selector this entry answers to.
    pub selector: Selector,
    /// Name used in logs.
    pub name: &'static str,
    /// Argument shapes, in frame order.
    pub args: &'static [Arg],
    /// Policy for a bad `Path` or `Buffer` argument.
    pub on_bad_pointer: FaultPolicy,
    /// Static properties.
    pub flags: OpFlags,
}

impl OpSpec {
    /// Frame words consumed after the selector.
    pub fn arg_words(&self) -> usize {
        self.args.iter().map(|arg| arg.words()).sum()
    }

    /// Whether a result word is delivered.
    pub fn returns_value(&self) -> bool {
        self.flags.contains(OpFlags::RETURNS_VALUE)
    }
}

const fn op(
    selector: Selector,
    name: &'static str,
    args: &'static [Arg],
    on_bad_pointer: FaultPolicy,
    flags: OpFlags,
) -> OpSpec {
    OpSpec {
        selector,
        name,
        args,
        on_bad_pointer,
        flags,
    }
}

const RET: OpFlags = OpFlags::RETURNS_VALUE;
const RET_FD: OpFlags = OpFlags::RETURNS_VALUE.union(OpFlags::USES_FDS);

/// Every supported operation, indexed by selector value.
pub static OPERATIONS: [OpSpec; 13] = [
    op(Selector::Halt, "halt", &[], FaultPolicy::Terminate, OpFlags::NO_RETURN),
    op(Selector::Exit, "exit", &[Arg::Value], FaultPolicy::Terminate, OpFlags::NO_RETURN),
    op(
        Selector::Exec,
        "exec",
        &[Arg::Path],
        FaultPolicy::Fail(ERROR_WORD),
        RET.union(OpFlags::MAY_BLOCK),
    ),
    op(
        Selector::Wait,
        "wait",
        &[Arg::Value],
        FaultPolicy::Terminate,
        RET.union(OpFlags::MAY_BLOCK),
    ),
    op(Selector::Create, "create", &[Arg::Path, Arg::Value], FaultPolicy::Terminate, RET),
    op(Selector::Remove, "remove", &[Arg::Path], FaultPolicy::Terminate, RET),
    op(Selector::Open, "open", &[Arg::Path], FaultPolicy::Terminate, RET_FD),
    op(Selector::Filesize, "filesize", &[Arg::Value], FaultPolicy::Terminate, RET_FD),
    op(
        Selector::Read,
        "read",
        &[Arg::Value, Arg::Buffer],
        FaultPolicy::Terminate,
        RET_FD,
    ),
    op(
        Selector::Write,
        "write",
        &[Arg::Value, Arg::Buffer],
        FaultPolicy::Fail(ERROR_WORD),
        RET_FD,
    ),
    op(
        Selector::Seek,
        "seek",
        &[Arg::Value, Arg::Value],
        FaultPolicy::Terminate,
        OpFlags::USES_FDS,
    ),
    op(Selector::Tell, "tell", &[Arg::Value], FaultPolicy::Terminate, RET_FD),
    op(Selector::Close, "close", &[Arg::Value], FaultPolicy::Terminate, OpFlags::USES_FDS),
];

/// Find the entry for a raw selector word.
pub fn lookup(raw: u32) -> Option<&'static OpSpec> {
    let selector = Selector::try_from(raw).ok()?;
    OPERATIONS.get(selector as usize)
}
