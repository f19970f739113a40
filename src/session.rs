use crate::config::DIRECTORY_SECTOR;

/// Per-caller execution context: which directory relative names resolve in.
/// Passed explicitly to every file system call instead of living on some
/// ambient thread object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    current_dir: u32,
}

impl Session {
    pub fn new(current_dir: u32) -> Self {
        Self { current_dir }
    }

    /// A session positioned at the root directory.
    pub fn root() -> Self {
        Self::new(DIRECTORY_SECTOR)
    }

    /// Header sector of the current directory.
    pub fn current_directory(&self) -> u32 {
        self.current_dir
    }

    pub fn set_current_directory(&mut self, sector: u32) {
        self.current_dir = sector;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::root()
    }
}
