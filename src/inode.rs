//! Management of file headers: the fixed-size index that maps a file's bytes
//! to the sectors holding them. Sizes are set once at allocation.

use alloc::string::String;
use alloc::vec;
use core::fmt::Write;

use log::debug;

use crate::bitmap::FreeMap;
use crate::config::*;
use crate::error::{Capacity, FsError, Result};
use crate::structs::FileHeader;
use crate::BlockDevice;

impl FileHeader {
    /// Reserves enough data sectors in `free_map` to hold `num_bytes`.
    /// On failure the map is left exactly as it was.
    pub fn allocate(&mut self, free_map: &mut FreeMap, num_bytes: usize) -> Result<()> {
        if num_bytes > MAX_FILE_SIZE {
            return Err(FsError::CapacityExceeded(Capacity::FileTooLarge));
        }
        let sectors_needed = num_bytes.div_ceil(SECTOR_SIZE);
        if free_map.num_clear() < sectors_needed {
            return Err(FsError::CapacityExceeded(Capacity::NoFreeSector));
        }

        let mut taken = [0u32; NUM_DIRECT];
        for i in 0..sectors_needed {
            match free_map.find() {
                Some(sector) => taken[i] = sector,
                None => {
                    for &sector in &taken[..i] {
                        free_map.clear(sector)?;
                    }
                    return Err(FsError::CapacityExceeded(Capacity::NoFreeSector));
                }
            }
        }

        self.num_bytes = num_bytes as u32;
        self.num_sectors = sectors_needed as u32;
        self.data_sectors = taken;
        debug!("allocated {} bytes in sectors {:?}", num_bytes, self.data_sectors());
        Ok(())
    }

    /// Releases every data sector this header records.
    pub fn deallocate(&self, free_map: &mut FreeMap) -> Result<()> {
        for &sector in self.data_sectors() {
            if !free_map.test(sector) {
                return Err(FsError::Corruption {
                    sector,
                    detail: String::from("data sector already free"),
                });
            }
        }
        for &sector in self.data_sectors() {
            free_map.clear(sector)?;
        }
        Ok(())
    }

    pub fn fetch_from(device: &impl BlockDevice, sector: u32) -> Result<Self> {
        let mut buf = [0u8; SECTOR_SIZE];
        device.read_sector(sector, &mut buf)?;
        FileHeader::from_bytes(sector, &buf)
    }

    pub fn write_back(&self, device: &impl BlockDevice, sector: u32) -> Result<()> {
        device.write_sector(sector, &self.to_bytes())
    }

    /// Sector holding the byte at `offset`, if the offset is inside the file.
    pub fn byte_to_sector(&self, offset: usize) -> Option<u32> {
        if offset >= self.num_bytes as usize {
            return None;
        }
        Some(self.data_sectors[offset / SECTOR_SIZE])
    }

    pub fn file_length(&self) -> usize {
        self.num_bytes as usize
    }

    pub fn data_sectors(&self) -> &[u32] {
        &self.data_sectors[..self.num_sectors as usize]
    }

    /// Header followed by the file's contents, printable bytes as-is and the
    /// rest escaped.
    pub fn print(&self, device: &impl BlockDevice) -> Result<String> {
        let mut out = String::new();
        let _ = write!(out, "FileHeader contents. File size: {}. File blocks:", self.num_bytes);
        for sector in self.data_sectors() {
            let _ = write!(out, " {}", sector);
        }
        let _ = writeln!(out, "\nFile contents:");

        let mut buf = vec![0u8; SECTOR_SIZE];
        let mut remaining = self.file_length();
        for &sector in self.data_sectors() {
            device.read_sector(sector, &mut buf)?;
            let chunk = remaining.min(SECTOR_SIZE);
            for &byte in &buf[..chunk] {
                if (0x20..=0x7e).contains(&byte) {
                    out.push(byte as char);
                } else {
                    let _ = write!(out, "\\{:x}", byte);
                }
            }
            remaining -= chunk;
            out.push('\n');
        }
        Ok(out)
    }
}
