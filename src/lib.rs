//! Tauon is a tiny sector-level file system with fixed-size files.
//! No permissions, timestamps, links, growable files or journaling.
//!
//! Tauon's on-disk layout:
//! - Sector 0: header of the free-map file
//! - Sector 1: header of the root directory file
//! - Everything else: file headers and data, handed out by the free map
//!
//! The free map and the root directory are ordinary files described by the
//! very headers they manage; `FileSystem::format` materializes both before
//! any directory lookup can happen.
//!
//! Tauon's layers (from bottom to top):
//! 1. Block Device: fixed-size sector read/write.                       | User implemented (hardware-specific)
//! 2. Free Map: one bit per sector.                                     | Fs implemented
//! 3. File Header: byte length and sector list of one file.             | Fs implemented
//! 4. Open File: positional I/O through a header.                       | Fs implemented
//! 5. Directory/Path: fixed-capacity name tables, "." and "..".         | Fs implemented
//! 6. Open File Table: handles, shared cursors.                         | Fs implemented
//! 7. FileSystem: the controller; callers carry a `Session` for cwd.    | Fs implemented

extern crate alloc;

mod config;
mod block_dev;
mod structs;
mod bitmap;
mod inode;
mod file;
mod directory;
mod path;
mod session;
mod open_table;
mod fs;
mod error;

#[cfg(test)]
mod testing;

pub use block_dev::BlockDevice;
pub use config::*;
pub use structs::*;
pub use bitmap::FreeMap;
pub use file::OpenFile;
pub use directory::*;
pub use path::*;
pub use session::Session;
pub use open_table::*;
pub use fs::*;
pub use error::{Capacity, FsError};
pub use error::FsError as Error;
pub use error::Result;
