//! Host-side doubles for the kernel services the boundary calls.

use core::cell::Cell;
use std::vec::Vec;

use crate::mm::{Fault, UserAddr, UserMemory};
use crate::services::{Console, FileSystem, InterruptRegistry, IntrLevel, Pid, ProcessLifecycle};

/// Sparse user address space. Accesses outside a mapped region fault, and
/// so do stores into a protected range.
pub struct SimMemory {
    regions: Vec<(u32, Vec<u8>)>,
    read_only: Vec<(u32, u32)>,
    probes: Cell<usize>,
}

impl SimMemory {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            read_only: Vec::new(),
            probes: Cell::new(0),
        }
    }

    /// Map `len` zero bytes at `base`.
    pub fn map(&mut self, base: u32, len: u32) {
        self.regions.push((base, std::vec![0; len as usize]));
    }

    /// Make `[base, base + len)` readable but not writable.
    pub fn protect(&mut self, base: u32, len: u32) {
        self.read_only.push((base, len));
    }

    fn is_protected(&self, addr: u32) -> bool {
        self.read_only
            .iter()
            .any(|&(base, len)| addr.checked_sub(base).is_some_and(|offset| offset < len))
    }

    /// Number of probes issued so far.
    pub fn probes(&self) -> usize {
        self.probes.get()
    }

    fn locate(&self, addr: u32) -> Option<(usize, usize)> {
        self.regions.iter().enumerate().find_map(|(region, (base, bytes))| {
            let offset = addr.checked_sub(*base)? as usize;
            (offset < bytes.len()).then_some((region, offset))
        })
    }

    /// Store bytes directly. Panics if any byte is unmapped.
    pub fn poke(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            let (region, offset) = self.locate(addr + i as u32).expect("poke unmapped");
            self.regions[region].1[offset] = byte;
        }
    }

    /// Load bytes directly. Panics if any byte is unmapped.
    pub fn peek(&self, addr: u32, len: u32) -> Vec<u8> {
        (0..len)
            .map(|i| {
                let (region, offset) = self.locate(addr + i).expect("peek unmapped");
                self.regions[region].1[offset]
            })
            .collect()
    }

    /// Lay out little-endian words starting at `addr`.
    pub fn push_words(&mut self, addr: u32, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.poke(addr + 4 * i as u32, &word.to_le_bytes());
        }
    }
}

impl UserMemory for SimMemory {
    fn probe_read(&self, addr: UserAddr) -> Result<u8, Fault> {
        self.probes.set(self.probes.get() + 1);
        let (region, offset) = self.locate(addr.as_u32()).ok_or(Fault::Unmapped(addr))?;
        Ok(self.regions[region].1[offset])
    }

    fn probe_write(&mut self, addr: UserAddr, value: u8) -> Result<(), Fault> {
        self.probes.set(self.probes.get() + 1);
        if self.is_protected(addr.as_u32()) {
            return Err(Fault::Unmapped(addr));
        }
        let (region, offset) = self.locate(addr.as_u32()).ok_or(Fault::Unmapped(addr))?;
        self.regions[region].1[offset] = value;
        Ok(())
    }
}

/// Open file handle into [`SimFs`].
#[derive(Debug, PartialEq, Eq)]
pub struct SimFile {
    inode: usize,
    pos: u32,
}

struct Inode {
    name: Vec<u8>,
    data: Vec<u8>,
    removed: bool,
}

/// Flat, fixed-size-file store.
pub struct SimFs {
    inodes: Vec<Inode>,
    closes: usize,
    pub reads: usize,
}

impl SimFs {
    pub fn new() -> Self {
        Self {
            inodes: Vec::new(),
            closes: 0,
            reads: 0,
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes
    }

    /// No live files.
    pub fn is_empty(&self) -> bool {
        self.inodes.iter().all(|inode| inode.removed)
    }

    fn find(&self, name: &[u8]) -> Option<usize> {
        self.inodes
            .iter()
            .position(|inode| !inode.removed && inode.name == name)
    }
}

impl FileSystem for SimFs {
    type File = SimFile;

    fn create(&mut self, name: &[u8], initial_size: u32) -> bool {
        if name.is_empty() || self.find(name).is_some() {
            return false;
        }
        self.inodes.push(Inode {
            name: name.to_vec(),
            data: std::vec![0; initial_size as usize],
            removed: false,
        });
        true
    }

    fn remove(&mut self, name: &[u8]) -> bool {
        match self.find(name) {
            Some(index) => {
                self.inodes[index].removed = true;
                true
            }
            None => false,
        }
    }

    fn open(&mut self, name: &[u8]) -> Option<SimFile> {
        self.find(name).map(|inode| SimFile { inode, pos: 0 })
    }

    fn close(&mut self, _file: SimFile) {
        self.closes += 1;
    }

    fn read(&mut self, file: &mut SimFile, dst: &mut [u8]) -> usize {
        self.reads += 1;
        let data = &self.inodes[file.inode].data;
        let start = (file.pos as usize).min(data.len());
        let count = dst.len().min(data.len() - start);
        dst[..count].copy_from_slice(&data[start..start + count]);
        file.pos += count as u32;
        count
    }

    fn write(&mut self, file: &mut SimFile, src: &[u8]) -> usize {
        let data = &mut self.inodes[file.inode].data;
        let start = (file.pos as usize).min(data.len());
        let count = src.len().min(data.len() - start);
        data[start..start + count].copy_from_slice(&src[..count]);
        file.pos += count as u32;
        count
    }

    fn seek(&mut self, file: &mut SimFile, pos: u32) {
        file.pos = pos;
    }

    fn tell(&self, file: &SimFile) -> u32 {
        file.pos
    }

    fn length(&self, file: &SimFile) -> u32 {
        self.inodes[file.inode].data.len() as u32
    }
}

/// Records lifecycle requests. Commands starting with `no-such` fail to load.
pub struct SimProcs {
    next_pid: i32,
    children: Vec<(Pid, Option<i32>)>,
    pub spawned: Vec<Vec<u8>>,
    pub terminated: Vec<(Pid, i32)>,
    pub halted: bool,
}

impl SimProcs {
    pub fn new() -> Self {
        Self {
            next_pid: 100,
            children: Vec::new(),
            spawned: Vec::new(),
            terminated: Vec::new(),
            halted: false,
        }
    }

    /// Mark a spawned child as exited with `status`.
    pub fn exit_child(&mut self, pid: Pid, status: i32) {
        if let Some(child) = self.children.iter_mut().find(|(p, _)| *p == pid) {
            child.1 = Some(status);
        }
    }
}

impl ProcessLifecycle for SimProcs {
    fn terminate(&mut self, current: Pid, status: i32) {
        self.terminated.push((current, status));
    }

    fn spawn(&mut self, command_line: &[u8]) -> Option<Pid> {
        self.spawned.push(command_line.to_vec());
        if command_line.starts_with(b"no-such") {
            return None;
        }
        let pid = Pid::new(self.next_pid);
        self.next_pid += 1;
        self.children.push((pid, None));
        Some(pid)
    }

    fn await_child(&mut self, pid: Pid) -> i32 {
        match self.children.iter().position(|(p, _)| *p == pid) {
            Some(index) => {
                let (_, status) = self.children.remove(index);
                status.unwrap_or(-1)
            }
            None => -1,
        }
    }

    fn halt_machine(&mut self) {
        self.halted = true;
    }
}

/// Captures standard output.
#[derive(Default)]
pub struct SimConsole {
    pub out: Vec<u8>,
    pub calls: usize,
}

impl Console for SimConsole {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
        self.calls += 1;
    }
}

/// Records vector registrations.
#[derive(Default)]
pub struct SimRegistry {
    pub entries: Vec<(u8, u8, IntrLevel, &'static str)>,
}

impl InterruptRegistry for SimRegistry {
    fn register(&mut self, vector: u8, dpl: u8, level: IntrLevel, name: &'static str) {
        self.entries.push((vector, dpl, level, name));
    }
}
