//! Free-space bitmap over every sector of the device.
//! The bitmap is itself stored as an ordinary file whose header lives in
//! `FREE_MAP_SECTOR`. Callers work on an in-memory copy and write it back only
//! once their whole operation has succeeded.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{FsError, Result};
use crate::file::OpenFile;
use crate::BlockDevice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeMap {
    bits: Vec<u8>,
    num_bits: usize,
}

impl FreeMap {
    /// A map of `num_bits` sectors, all free.
    pub fn new(num_bits: usize) -> Self {
        Self {
            bits: vec![0; num_bits.div_ceil(8)],
            num_bits,
        }
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    fn locate(&self, sector: u32) -> Result<(usize, u8)> {
        if sector as usize >= self.num_bits {
            return Err(FsError::InvalidSector(sector));
        }
        Ok((sector as usize / 8, 1 << (sector % 8)))
    }

    /// Reserves `sector`.
    pub fn mark(&mut self, sector: u32) -> Result<()> {
        let (byte, mask) = self.locate(sector)?;
        self.bits[byte] |= mask;
        Ok(())
    }

    /// Frees `sector`.
    pub fn clear(&mut self, sector: u32) -> Result<()> {
        let (byte, mask) = self.locate(sector)?;
        self.bits[byte] &= !mask;
        Ok(())
    }

    /// Whether `sector` is in use. Out-of-range sectors read as free.
    pub fn test(&self, sector: u32) -> bool {
        match self.locate(sector) {
            Ok((byte, mask)) => self.bits[byte] & mask != 0,
            Err(_) => false,
        }
    }

    /// Takes the first free sector, marking it used before returning it.
    /// Returns `None` once every sector is in use.
    pub fn find(&mut self) -> Option<u32> {
        let sector = (0..self.num_bits as u32).find(|&s| !self.test(s))?;
        let (byte, mask) = self.locate(sector).ok()?;
        self.bits[byte] |= mask;
        Some(sector)
    }

    pub fn num_clear(&self) -> usize {
        (0..self.num_bits as u32).filter(|&s| !self.test(s)).count()
    }

    pub fn used_sectors(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_bits as u32).filter(|&s| self.test(s))
    }

    /// Loads the whole bitmap from the free-map file.
    pub fn fetch_from<D: BlockDevice>(&mut self, file: &OpenFile<D>) -> Result<()> {
        let read = file.read_at(&mut self.bits, 0)?;
        if read != self.bits.len() {
            return Err(FsError::Corruption {
                sector: file.sector(),
                detail: format!("free map file holds {} of {} bytes", read, self.bits.len()),
            });
        }
        Ok(())
    }

    /// Persists the whole bitmap to the free-map file.
    pub fn write_back<D: BlockDevice>(&self, file: &OpenFile<D>) -> Result<()> {
        let written = file.write_at(&self.bits, 0)?;
        if written != self.bits.len() {
            return Err(FsError::Corruption {
                sector: file.sector(),
                detail: format!("free map file takes {} of {} bytes", written, self.bits.len()),
            });
        }
        Ok(())
    }
}

impl fmt::Display for FreeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap set:")?;
        for sector in self.used_sectors() {
            write!(f, " {}", sector)?;
        }
        Ok(())
    }
}
