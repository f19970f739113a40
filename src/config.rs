pub const SECTOR_SIZE: usize = 128;
pub const SECTORS_PER_TRACK: usize = 32;
pub const NUM_TRACKS: usize = 32;
pub const NUM_SECTORS: usize = SECTORS_PER_TRACK * NUM_TRACKS;

pub const FREE_MAP_SECTOR: u32 = 0; // Header sector of the free-map file
pub const DIRECTORY_SECTOR: u32 = 1; // Header sector of the root directory file

pub const NUM_DIRECT: usize = (SECTOR_SIZE - 2 * 4) / 4; // Data sector slots in one header
pub const MAX_FILE_SIZE: usize = NUM_DIRECT * SECTOR_SIZE;

pub const FILE_NAME_MAX_LEN: usize = 9;
pub const NUM_DIR_ENTRIES: usize = 10; // Fixed number of slots per directory
pub const DIR_ENTRY_SIZE: usize = 2 + (FILE_NAME_MAX_LEN + 1) + 4; // in_use + type + name + sector
pub const DOT_NAME: &str = ".";
pub const DOTDOT_NAME: &str = "..";
pub const PATH_SEPARATOR: char = '/';

pub const FREE_MAP_FILE_SIZE: usize = NUM_SECTORS / 8;
pub const DIRECTORY_FILE_SIZE: usize = DIR_ENTRY_SIZE * NUM_DIR_ENTRIES;

pub const MAX_OPEN_FILES: usize = 10;
pub const OPEN_FILE_NAME_LEN: usize = 31; // Names kept in the open-file table are truncated to this
