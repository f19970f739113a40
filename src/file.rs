//! Byte-addressed access to a file through its header.
//! Files never grow: reads and writes are clamped to the length fixed at
//! allocation time.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::config::SECTOR_SIZE;
use crate::error::Result;
use crate::structs::FileHeader;
use crate::BlockDevice;

/// I/O object bound to the header sector of one file.
#[derive(Debug)]
pub struct OpenFile<D: BlockDevice> {
    device: Arc<D>,
    sector: u32,
    header: FileHeader,
}

impl<D: BlockDevice> OpenFile<D> {
    /// Loads the header at `sector`.
    pub fn open(device: Arc<D>, sector: u32) -> Result<Self> {
        let header = FileHeader::fetch_from(&*device, sector)?;
        Ok(Self {
            device,
            sector,
            header,
        })
    }

    pub fn sector(&self) -> u32 {
        self.sector
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn length(&self) -> usize {
        self.header.file_length()
    }

    /// Reads into `buf` starting at `position`.
    /// Returns the number of bytes read, 0 at or past the end of the file.
    pub fn read_at(&self, buf: &mut [u8], position: usize) -> Result<usize> {
        let len = self.length();
        if buf.is_empty() || position >= len {
            return Ok(0);
        }
        let to_read = buf.len().min(len - position);

        let mut bytes_read = 0;
        let mut current_offset = position;
        let mut sector_buf = [0u8; SECTOR_SIZE];

        while bytes_read < to_read {
            let Some(sector) = self.header.byte_to_sector(current_offset) else {
                break;
            };
            self.device.read_sector(sector, &mut sector_buf)?;
            let start = current_offset % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - start).min(to_read - bytes_read);
            buf[bytes_read..bytes_read + chunk].copy_from_slice(&sector_buf[start..start + chunk]);

            bytes_read += chunk;
            current_offset += chunk;
        }

        Ok(bytes_read)
    }

    /// Writes `buf` starting at `position`.
    /// Returns the number of bytes written; anything past the end of the
    /// file is dropped.
    pub fn write_at(&self, buf: &[u8], position: usize) -> Result<usize> {
        let len = self.length();
        if buf.is_empty() || position >= len {
            return Ok(0);
        }
        let to_write = buf.len().min(len - position);

        let mut bytes_written = 0;
        let mut current_offset = position;
        let mut sector_buf = [0u8; SECTOR_SIZE];

        while bytes_written < to_write {
            let Some(sector) = self.header.byte_to_sector(current_offset) else {
                break;
            };
            let start = current_offset % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - start).min(to_write - bytes_written);
            // Partial sectors keep the bytes around the written range.
            if chunk < SECTOR_SIZE {
                self.device.read_sector(sector, &mut sector_buf)?;
            }
            sector_buf[start..start + chunk].copy_from_slice(&buf[bytes_written..bytes_written + chunk]);
            self.device.write_sector(sector, &sector_buf)?;

            bytes_written += chunk;
            current_offset += chunk;
        }

        Ok(bytes_written)
    }

    /// Whole contents of the file.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.length()];
        let read = self.read_at(&mut buf, 0)?;
        buf.truncate(read);
        Ok(buf)
    }
}
