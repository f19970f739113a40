//! On-disk records and their little-endian encoding.

use alloc::format;

use crate::config::*;
use crate::error::{FsError, Result};

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Per-file index: byte length plus the ordered list of data sectors.
/// Occupies exactly one sector on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub num_bytes: u32,
    pub num_sectors: u32,
    pub data_sectors: [u32; NUM_DIRECT],
}

impl FileHeader {
    pub const EMPTY: Self = Self {
        num_bytes: 0,
        num_sectors: 0,
        data_sectors: [0; NUM_DIRECT],
    };

    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut buf = [0u8; SECTOR_SIZE];
        write_u32(&mut buf, 0, self.num_bytes);
        write_u32(&mut buf, 4, self.num_sectors);
        for (i, sector) in self.data_sectors.iter().enumerate() {
            write_u32(&mut buf, 8 + i * 4, *sector);
        }
        buf
    }

    /// Decodes the header stored at `sector`.
    pub fn from_bytes(sector: u32, buf: &[u8]) -> Result<Self> {
        if buf.len() < SECTOR_SIZE {
            return Err(FsError::Corruption {
                sector,
                detail: format!("short header buffer ({} bytes)", buf.len()),
            });
        }
        let num_bytes = read_u32(buf, 0);
        let num_sectors = read_u32(buf, 4);
        if num_bytes as usize > MAX_FILE_SIZE
            || num_sectors as usize != (num_bytes as usize).div_ceil(SECTOR_SIZE)
        {
            return Err(FsError::Corruption {
                sector,
                detail: format!("header claims {} bytes in {} sectors", num_bytes, num_sectors),
            });
        }
        let mut data_sectors = [0u32; NUM_DIRECT];
        for (i, slot) in data_sectors.iter_mut().enumerate() {
            *slot = read_u32(buf, 8 + i * 4);
        }
        Ok(Self {
            num_bytes,
            num_sectors,
            data_sectors,
        })
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular = 1,
    Directory = 2,
}

impl FileType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(FileType::Regular),
            2 => Some(FileType::Directory),
            _ => None,
        }
    }
}

/// One directory slot: name bound to the header sector of a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub in_use: bool,
    pub ftype: FileType,
    pub sector: u32,
    pub name: [u8; FILE_NAME_MAX_LEN + 1], // Zero padded, always NUL terminated
}

impl DirEntry {
    pub const NULL: Self = Self {
        in_use: false,
        ftype: FileType::Regular,
        sector: 0,
        name: [0; FILE_NAME_MAX_LEN + 1],
    };

    pub fn new(name: &str, sector: u32, ftype: FileType) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > FILE_NAME_MAX_LEN {
            return Err(FsError::InvalidArgument(format!(
                "name {:?} must be 1..={} bytes",
                name, FILE_NAME_MAX_LEN
            )));
        }
        if name.contains(PATH_SEPARATOR) || bytes.contains(&0) {
            return Err(FsError::InvalidArgument(format!(
                "name {:?} contains a reserved character",
                name
            )));
        }
        let mut stored = [0u8; FILE_NAME_MAX_LEN + 1];
        stored[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            in_use: true,
            ftype,
            sector,
            name: stored,
        })
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..DIR_ENTRY_SIZE].fill(0);
        buf[0] = self.in_use as u8;
        buf[1] = self.ftype as u8;
        buf[2..2 + FILE_NAME_MAX_LEN + 1].copy_from_slice(&self.name);
        write_u32(buf, DIR_ENTRY_SIZE - 4, self.sector);
    }

    /// `sector` is the directory file's header sector, used for error reports.
    pub fn decode(sector: u32, buf: &[u8]) -> Result<Self> {
        let in_use = buf[0] != 0;
        if !in_use {
            return Ok(Self::NULL);
        }
        let ftype = FileType::from_u8(buf[1]).ok_or_else(|| FsError::Corruption {
            sector,
            detail: format!("unknown entry type {}", buf[1]),
        })?;
        let mut name = [0u8; FILE_NAME_MAX_LEN + 1];
        name.copy_from_slice(&buf[2..2 + FILE_NAME_MAX_LEN + 1]);
        name[FILE_NAME_MAX_LEN] = 0;
        Ok(Self {
            in_use,
            ftype,
            sector: read_u32(buf, DIR_ENTRY_SIZE - 4),
            name,
        })
    }
}
