//! Path splitting and resolution.
//! Paths are `/` separated; a leading `/` starts at the root directory,
//! anything else starts at the caller's current directory. Every
//! intermediate component must name a directory.

use alloc::format;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::*;
use crate::directory::Directory;
use crate::error::{FsError, Result};
use crate::structs::FileType;
use crate::BlockDevice;

pub fn is_absolute(path: &str) -> bool {
    path.starts_with(PATH_SEPARATOR)
}

/// Non-empty components of `path`, in order.
pub fn components(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Splits `path` into the directory part and the final component.
/// "a/b/c" -> ("a/b", "c"), "c" -> ("", "c"), "/c" -> ("/", "c").
pub fn split_parent(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Err(FsError::InvalidArgument(format!("path {:?} has no final component", path)));
    }
    match trimmed.rfind(PATH_SEPARATOR) {
        Some(0) => Ok((&trimmed[..1], &trimmed[1..])),
        Some(at) => Ok((&trimmed[..at], &trimmed[at + 1..])),
        None => Ok(("", trimmed)),
    }
}

/// Walks `path` from `start` (or from the root for absolute paths) and
/// returns the header sector of the directory it names.
pub fn resolve_dir<D: BlockDevice>(device: &Arc<D>, start: u32, path: &str) -> Result<u32> {
    let mut current = if is_absolute(path) { DIRECTORY_SECTOR } else { start };
    for component in components(path) {
        let (_, dir) = Directory::load(device, current)?;
        let entry = dir
            .find_entry(component)
            .ok_or_else(|| FsError::NotFound(component.to_string()))?;
        if entry.ftype != FileType::Directory {
            return Err(FsError::NotDirectory(component.to_string()));
        }
        current = entry.sector;
    }
    Ok(current)
}
