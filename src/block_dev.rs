use crate::error::Result;

pub trait BlockDevice: Send + Sync {
    /// Returns the number of sectors in the device.
    fn num_sectors(&self) -> usize;

    /// Reads one sector.
    /// buf.len() must be equal to sector_size().
    fn read_sector(&self, sector: u32, buf: &mut [u8]) -> Result<()>;

    /// Writes one sector.
    /// buf.len() must be equal to sector_size().
    fn write_sector(&self, sector: u32, buf: &[u8]) -> Result<()>;

    /// Flushes any buffered writes to the backing store.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the size of each sector in bytes.
    fn sector_size(&self) -> usize {
        crate::config::SECTOR_SIZE
    }
}
