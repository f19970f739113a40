//! Bounded table of open files.
//! Each slot binds a handle to one backing header sector plus a sequential
//! cursor. A sector is referenced by at most one slot: opening it again hands
//! back the existing handle, so both openers share the cursor.
//! Positional reads and writes never move the cursor.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use log::{debug, info, warn};

use crate::config::OPEN_FILE_NAME_LEN;
use crate::error::{Capacity, FsError, Result};
use crate::file::OpenFile;
use crate::BlockDevice;

/// Index of a slot in the open-file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub fn from_raw(raw: usize) -> Self {
        Handle(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct OpenFileEntry<D: BlockDevice> {
    sector: u32,
    name: String,
    cursor: usize,
    file: OpenFile<D>,
}

/// Snapshot of one in-use slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileInfo {
    pub handle: Handle,
    pub sector: u32,
    pub name: String,
    pub cursor: usize,
    pub length: usize,
}

fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(OPEN_FILE_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[derive(Debug)]
pub struct OpenFileTable<D: BlockDevice> {
    slots: Vec<Option<OpenFileEntry<D>>>,
}

impl<D: BlockDevice> OpenFileTable<D> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots in use.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_sector(&self, sector: u32) -> Option<Handle> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(e) if e.sector == sector))
            .map(Handle)
    }

    /// Registers `sector` under `name`, or returns the handle already bound
    /// to it. `open_file` builds the I/O object and only runs once a free
    /// slot is known to exist.
    pub fn open<F>(&mut self, name: &str, sector: u32, open_file: F) -> Result<Handle>
    where
        F: FnOnce() -> Result<OpenFile<D>>,
    {
        if let Some(handle) = self.find_by_sector(sector) {
            info!("'{}' is already open (handle {})", name, handle);
            return Ok(handle);
        }
        let index = self.slots.iter().position(|s| s.is_none()).ok_or_else(|| {
            warn!("open file table is full (max {} files)", self.capacity());
            FsError::CapacityExceeded(Capacity::OpenFileTableFull)
        })?;
        let file = open_file()?;
        self.slots[index] = Some(OpenFileEntry {
            sector,
            name: truncate_name(name),
            cursor: 0,
            file,
        });
        info!("'{}' opened (handle {}, sector {})", name, index, sector);
        Ok(Handle(index))
    }

    pub fn is_valid_handle(&self, handle: Handle) -> bool {
        matches!(self.slots.get(handle.0), Some(Some(_)))
    }

    fn entry(&self, handle: Handle, op: &str) -> Result<&OpenFileEntry<D>> {
        match self.slots.get(handle.0) {
            Some(Some(entry)) => Ok(entry),
            _ => {
                warn!("invalid file handle {} for {}", handle, op);
                Err(FsError::InvalidHandle(handle.0))
            }
        }
    }

    fn entry_mut(&mut self, handle: Handle, op: &str) -> Result<&mut OpenFileEntry<D>> {
        match self.slots.get_mut(handle.0) {
            Some(Some(entry)) => Ok(entry),
            _ => {
                warn!("invalid file handle {} for {}", handle, op);
                Err(FsError::InvalidHandle(handle.0))
            }
        }
    }

    /// Releases the slot. Closing a free or out-of-range handle is an error.
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        self.entry(handle, "close")?;
        if let Some(entry) = self.slots[handle.0].take() {
            info!("closed '{}' (handle {})", entry.name, handle);
        }
        Ok(())
    }

    /// Closes every slot in use. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = slot.take() {
                debug!("closing '{}' (handle {})", entry.name, index);
                closed += 1;
            }
        }
        info!("closed {} open files", closed);
        closed
    }

    /// Reads at the cursor and advances it by the bytes read.
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let entry = self.entry_mut(handle, "read")?;
        let read = entry.file.read_at(buf, entry.cursor)?;
        entry.cursor += read;
        debug!("read {} bytes from '{}' (handle {})", read, entry.name, handle);
        Ok(read)
    }

    /// Writes at the cursor and advances it by the bytes written.
    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize> {
        let entry = self.entry_mut(handle, "write")?;
        let written = entry.file.write_at(buf, entry.cursor)?;
        entry.cursor += written;
        debug!("wrote {} bytes to '{}' (handle {})", written, entry.name, handle);
        Ok(written)
    }

    pub fn read_at(&self, handle: Handle, buf: &mut [u8], position: usize) -> Result<usize> {
        let entry = self.entry(handle, "read_at")?;
        let read = entry.file.read_at(buf, position)?;
        debug!("read {} bytes from '{}' at {} (handle {})", read, entry.name, position, handle);
        Ok(read)
    }

    pub fn write_at(&self, handle: Handle, buf: &[u8], position: usize) -> Result<usize> {
        let entry = self.entry(handle, "write_at")?;
        let written = entry.file.write_at(buf, position)?;
        debug!("wrote {} bytes to '{}' at {} (handle {})", written, entry.name, position, handle);
        Ok(written)
    }

    /// Moves the cursor. Positions past the end are allowed and transfer
    /// nothing.
    pub fn seek(&mut self, handle: Handle, position: usize) -> Result<()> {
        self.entry_mut(handle, "seek")?.cursor = position;
        Ok(())
    }

    pub fn tell(&self, handle: Handle) -> Result<usize> {
        Ok(self.entry(handle, "tell")?.cursor)
    }

    pub fn entries(&self) -> Vec<OpenFileInfo> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref().map(|e| OpenFileInfo {
                    handle: Handle(index),
                    sector: e.sector,
                    name: e.name.clone(),
                    cursor: e.cursor,
                    length: e.file.length(),
                })
            })
            .collect()
    }
}
