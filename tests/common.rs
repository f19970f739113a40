//! Common utilities for tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tauon::{BlockDevice, Error, FileSystem, Result, NUM_SECTORS, SECTOR_SIZE};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

pub struct RamDisk {
    inner: Arc<Mutex<Vec<u8>>>,
    num_sectors: usize,
}

impl RamDisk {
    /// Creates a new RamDisk with the specified number of sectors.
    /// Each sector is SECTOR_SIZE bytes.
    pub fn new(num_sectors: usize) -> Self {
        let inner = Arc::new(Mutex::new(vec![0u8; num_sectors * SECTOR_SIZE]));
        RamDisk { inner, num_sectors }
    }

    /// Raw copy of every sector, for comparing disk state.
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }
}

impl BlockDevice for RamDisk {
    fn num_sectors(&self) -> usize {
        self.num_sectors
    }

    fn read_sector(&self, sector: u32, buf: &mut [u8]) -> Result<()> {
        if sector as usize >= self.num_sectors {
            return Err(Error::InvalidSector(sector));
        }
        let start = sector as usize * SECTOR_SIZE;
        let data = self.inner.lock().unwrap();
        buf.copy_from_slice(&data[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&self, sector: u32, buf: &[u8]) -> Result<()> {
        if sector as usize >= self.num_sectors {
            return Err(Error::InvalidSector(sector));
        }
        let start = sector as usize * SECTOR_SIZE;
        let mut data = self.inner.lock().unwrap();
        data[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }
}

/// A freshly formatted file system on a full-size RamDisk.
pub fn formatted() -> (Arc<RamDisk>, FileSystem<RamDisk>) {
    let disk = Arc::new(RamDisk::new(NUM_SECTORS));
    let fs = FileSystem::format(Arc::clone(&disk)).unwrap();
    (disk, fs)
}
