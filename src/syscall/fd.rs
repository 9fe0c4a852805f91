//! File Descriptor Table
//!
//! Each process owns one table mapping small integers to open files.
//!
//! # Design
//! - Fixed-size array of optional, owned file objects
//! - Descriptors 0 and 1 are reserved for stdin/stdout and never hold a file
//! - Allocation always picks the lowest free descriptor >= 2
//! - Only `allocate`, `lookup` and `release` touch the slots; there is no
//!   raw indexing from outside

use core::fmt;

use crate::config::{FD_TABLE_SIZE, FIRST_FILE_FD};
use crate::services::FileSystem;

/// A descriptor number known to be inside the table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct Fd(u32);

impl Fd {
    /// Create a descriptor.
    ///
    /// Returns None if the number is out of range.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        if (raw as usize) < FD_TABLE_SIZE {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Get the raw descriptor number.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn is_reserved(self) -> bool {
        self.0 < FIRST_FILE_FD
    }
}

/// Error type for descriptor lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The number is outside `[0, FD_TABLE_SIZE)`.
    BadDescriptor,
    /// Descriptor 0 or 1, which never names a file.
    Reserved,
    /// No file is open under this descriptor.
    Empty,
}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadDescriptor => write!(f, "descriptor out of range"),
            Self::Reserved => write!(f, "descriptor reserved for standard streams"),
            Self::Empty => write!(f, "descriptor not open"),
        }
    }
}

/// Every slot is in use. Carries the file back so the caller can close it.
#[derive(Debug)]
pub struct TableFull<F>(pub F);

impl<F> TableFull<F> {
    /// Recover the rejected file.
    pub fn into_inner(self) -> F {
        self.0
    }
}

/// Per-process descriptor table.
pub struct FdTable<F> {
    slots: [Option<F>; FD_TABLE_SIZE],
}

impl<F> FdTable<F> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    fn slot(raw: u32) -> Result<Fd, FdError> {
        let fd = Fd::new(raw).ok_or(FdError::BadDescriptor)?;
        if fd.is_reserved() {
            return Err(FdError::Reserved);
        }
        Ok(fd)
    }

    /// Store `file` under the lowest free descriptor >= 2.
    pub fn allocate(&mut self, file: F) -> Result<Fd, TableFull<F>> {
        let free = self
            .slots
            .iter()
            .enumerate()
            .skip(FIRST_FILE_FD as usize)
            .find(|(_, slot)| slot.is_none())
            .map(|(index, _)| index);

        match free {
            Some(index) => {
                self.slots[index] = Some(file);
                Ok(Fd(index as u32))
            }
            None => Err(TableFull(file)),
        }
    }

    /// Look up the file open under `raw`.
    pub fn lookup(&self, raw: u32) -> Result<&F, FdError> {
        let fd = Self::slot(raw)?;
        self.slots[fd.index()].as_ref().ok_or(FdError::Empty)
    }

    /// Look up the file open under `raw` for mutation (read/write/seek).
    pub fn lookup_mut(&mut self, raw: u32) -> Result<&mut F, FdError> {
        let fd = Self::slot(raw)?;
        self.slots[fd.index()].as_mut().ok_or(FdError::Empty)
    }

    /// Close the file open under `raw` and empty its slot.
    ///
    /// Calling this on an empty, reserved or out-of-range descriptor
    /// changes nothing and reports why.
    pub fn release<S>(&mut self, raw: u32, fs: &mut S) -> Result<(), FdError>
    where
        S: FileSystem<File = F> + ?Sized,
    {
        let fd = Self::slot(raw)?;
        let file = self.slots[fd.index()].take().ok_or(FdError::Empty)?;
        fs.close(file);
        Ok(())
    }

    /// Close every open file. Returns how many were closed.
    pub fn release_all<S>(&mut self, fs: &mut S) -> usize
    where
        S: FileSystem<File = F> + ?Sized,
    {
        let mut closed = 0;
        for slot in self.slots.iter_mut() {
            if let Some(file) = slot.take() {
                fs.close(file);
                closed += 1;
            }
        }
        closed
    }

    /// Number of open files.
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<F> Default for FdTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for FdTable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_some())
                    .map(|(index, _)| index),
            )
            .finish()
    }
}
