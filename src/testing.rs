//! In-memory disk for unit tests.

use alloc::vec;
use alloc::vec::Vec;

use parking_lot::Mutex;

use crate::config::SECTOR_SIZE;
use crate::error::{FsError, Result};
use crate::BlockDevice;

pub struct MemDisk {
    data: Mutex<Vec<u8>>,
    num_sectors: usize,
}

impl MemDisk {
    pub fn new(num_sectors: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; num_sectors * SECTOR_SIZE]),
            num_sectors,
        }
    }
}

impl BlockDevice for MemDisk {
    fn num_sectors(&self) -> usize {
        self.num_sectors
    }

    fn read_sector(&self, sector: u32, buf: &mut [u8]) -> Result<()> {
        if sector as usize >= self.num_sectors {
            return Err(FsError::InvalidSector(sector));
        }
        let start = sector as usize * SECTOR_SIZE;
        buf.copy_from_slice(&self.data.lock()[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&self, sector: u32, buf: &[u8]) -> Result<()> {
        if sector as usize >= self.num_sectors {
            return Err(FsError::InvalidSector(sector));
        }
        let start = sector as usize * SECTOR_SIZE;
        self.data.lock()[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }
}
