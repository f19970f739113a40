//! Fixed-capacity directories.
//! A directory is a table of `NUM_DIR_ENTRIES` slots stored as an ordinary
//! fixed-size file. Every directory holds a "." entry naming itself and a
//! ".." entry naming its parent; the root is its own parent.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::config::*;
use crate::error::{Capacity, FsError, Result};
use crate::file::OpenFile;
use crate::structs::*;
use crate::BlockDevice;

pub fn trim_zero(name: &[u8]) -> &[u8] {
    let mut end = name.len();
    while end > 0 && name[end - 1] == 0 {
        end -= 1;
    }
    &name[..end]
}

impl DirEntry {
    pub fn name_bytes(&self) -> &[u8] {
        trim_zero(&self.name)
    }

    pub fn name_str(&self) -> &str {
        core::str::from_utf8(self.name_bytes()).unwrap_or("?")
    }

    pub fn name_eq(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }
}

/// Owned view of an active entry, handed out by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub sector: u32,
    pub ftype: FileType,
}

impl From<&DirEntry> for DirEntryInfo {
    fn from(entry: &DirEntry) -> Self {
        Self {
            name: entry.name_str().to_string(),
            sector: entry.sector,
            ftype: entry.ftype,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    /// An empty directory with `capacity` inactive slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![DirEntry::NULL; capacity],
        }
    }

    /// A new directory seeded with "." and "..".
    pub fn formatted(capacity: usize, self_sector: u32, parent_sector: u32) -> Result<Self> {
        let mut dir = Self::new(capacity);
        dir.add(DOT_NAME, self_sector, FileType::Directory)?;
        dir.add(DOTDOT_NAME, parent_sector, FileType::Directory)?;
        Ok(dir)
    }

    /// Opens the directory file at `sector` and loads its table.
    pub fn load<D: BlockDevice>(device: &Arc<D>, sector: u32) -> Result<(OpenFile<D>, Self)> {
        let file = OpenFile::open(Arc::clone(device), sector)?;
        let mut dir = Self::new(NUM_DIR_ENTRIES);
        dir.fetch_from(&file)?;
        Ok((file, dir))
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Loads every slot, active or not, from the directory's file.
    pub fn fetch_from<D: BlockDevice>(&mut self, file: &OpenFile<D>) -> Result<()> {
        let mut buf = vec![0u8; self.capacity() * DIR_ENTRY_SIZE];
        let read = file.read_at(&mut buf, 0)?;
        if read != buf.len() {
            return Err(FsError::Corruption {
                sector: file.sector(),
                detail: format!("directory file holds {} of {} bytes", read, buf.len()),
            });
        }
        for (slot, raw) in self.entries.iter_mut().zip(buf.chunks_exact(DIR_ENTRY_SIZE)) {
            *slot = DirEntry::decode(file.sector(), raw)?;
        }
        Ok(())
    }

    /// Persists every slot to the directory's file.
    pub fn write_back<D: BlockDevice>(&self, file: &OpenFile<D>) -> Result<()> {
        let mut buf = vec![0u8; self.capacity() * DIR_ENTRY_SIZE];
        for (entry, raw) in self.entries.iter().zip(buf.chunks_exact_mut(DIR_ENTRY_SIZE)) {
            entry.encode(raw);
        }
        let written = file.write_at(&buf, 0)?;
        if written != buf.len() {
            return Err(FsError::Corruption {
                sector: file.sector(),
                detail: format!("directory file takes {} of {} bytes", written, buf.len()),
            });
        }
        Ok(())
    }

    fn find_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.in_use && e.name_eq(name))
    }

    /// Header sector of the entry called `name`.
    pub fn find(&self, name: &str) -> Option<u32> {
        self.find_entry(name).map(|e| e.sector)
    }

    pub fn find_entry(&self, name: &str) -> Option<&DirEntry> {
        self.find_index(name).map(|i| &self.entries[i])
    }

    pub fn entry_type(&self, name: &str) -> Option<FileType> {
        self.find_entry(name).map(|e| e.ftype)
    }

    /// Binds `name` to `sector` in the first free slot.
    pub fn add(&mut self, name: &str, sector: u32, ftype: FileType) -> Result<()> {
        let entry = DirEntry::new(name, sector, ftype)?;
        if self.find_index(name).is_some() {
            return Err(FsError::AlreadyExists(name.to_string()));
        }
        let slot = self
            .entries
            .iter_mut()
            .find(|e| !e.in_use)
            .ok_or(FsError::CapacityExceeded(Capacity::DirectoryFull))?;
        *slot = entry;
        Ok(())
    }

    /// Marks the entry called `name` inactive.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index = self
            .find_index(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        self.entries[index] = DirEntry::NULL;
        Ok(())
    }

    /// Active entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> + '_ {
        self.entries.iter().filter(|e| e.in_use)
    }

    pub fn list(&self) -> Vec<DirEntryInfo> {
        self.entries().map(DirEntryInfo::from).collect()
    }

    /// True when nothing but "." and ".." is left.
    pub fn is_empty(&self) -> bool {
        self.entries()
            .all(|e| e.name_eq(DOT_NAME) || e.name_eq(DOTDOT_NAME))
    }

    /// Every entry, and for regular files their header and contents.
    pub fn print(&self, device: &impl BlockDevice) -> Result<String> {
        let mut out = String::from("Directory contents:\n");
        for entry in self.entries() {
            let kind = match entry.ftype {
                FileType::Regular => "file",
                FileType::Directory => "dir",
            };
            let _ = writeln!(out, "Name: {}, Sector: {}, Type: {}", entry.name_str(), entry.sector, kind);
            if entry.ftype == FileType::Regular {
                let hdr = FileHeader::fetch_from(device, entry.sector)?;
                out.push_str(&hdr.print(device)?);
            }
        }
        Ok(out)
    }
}
