//! Error taxonomy shared by every layer of the file system.
//!
//! Multi-structure mutations stage their changes in memory and only touch the
//! device once every step has succeeded, so any `Err` returned by a
//! controller operation means nothing was persisted.

use alloc::string::String;

use thiserror::Error;

/// Which fixed bound an operation ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// The free map has too few clear sectors.
    NoFreeSector,
    /// Every slot of the target directory is in use.
    DirectoryFull,
    /// The requested size does not fit in one file header.
    FileTooLarge,
    /// Every slot of the open-file table is in use.
    OpenFileTableFull,
}

impl core::fmt::Display for Capacity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let what = match self {
            Capacity::NoFreeSector => "no free sectors",
            Capacity::DirectoryFull => "directory full",
            Capacity::FileTooLarge => "file too large",
            Capacity::OpenFileTableFull => "open file table full",
        };
        f.write_str(what)
    }
}

#[derive(Debug, Error)]
pub enum FsError {
    /// Empty or oversized name, malformed path, reserved name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(Capacity),

    /// Handle out of range or referring to a closed slot.
    #[error("invalid file handle {0}")]
    InvalidHandle(usize),

    #[error("{0} is not a directory")]
    NotDirectory(String),

    /// Sector index outside the device.
    #[error("sector {0} out of range")]
    InvalidSector(u32),

    /// On-disk record that does not decode.
    #[error("corrupt metadata at sector {sector}: {detail}")]
    Corruption { sector: u32, detail: String },

    /// Device-level failure. Unrecoverable for the operation that hit it.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// True for failures of the device itself rather than of the request.
    pub fn is_io(&self) -> bool {
        matches!(self, FsError::Io(_) | FsError::InvalidSector(_))
    }
}

pub type Result<T> = core::result::Result<T, FsError>;
