use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::bitmap::FreeMap;
use crate::config::*;
use crate::directory::{DirEntryInfo, Directory};
use crate::error::{Capacity, FsError, Result};
use crate::file::OpenFile;
use crate::open_table::{Handle, OpenFileInfo, OpenFileTable};
use crate::path;
use crate::session::Session;
use crate::structs::*;
use crate::BlockDevice;

struct Inner<D: BlockDevice> {
    // Both kept open for the lifetime of the instance.
    free_map_file: OpenFile<D>,
    directory_file: OpenFile<D>,
    open_files: OpenFileTable<D>,
}

impl<D: BlockDevice> Inner<D> {
    fn load_free_map(&self) -> Result<FreeMap> {
        let mut free_map = FreeMap::new(NUM_SECTORS);
        free_map.fetch_from(&self.free_map_file)?;
        Ok(free_map)
    }
}

/// The file system controller.
///
/// Every call runs to completion under one lock, so at most one operation
/// touches the free map, the directories or the open-file table at a time.
/// Mutations are staged on in-memory copies of the free map and the affected
/// directory and written back only after every step has succeeded; a failed
/// call leaves the device untouched.
pub struct FileSystem<D: BlockDevice> {
    device: Arc<D>,
    inner: Mutex<Inner<D>>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Formats the device when `format` is set, mounts it otherwise.
    pub fn new(device: Arc<D>, format: bool) -> Result<Self> {
        if format {
            Self::format(device)
        } else {
            Self::mount(device)
        }
    }

    /// Lays down an empty file system: a free map with the two well-known
    /// header sectors taken, and a root directory holding only "." and "..".
    pub fn format(device: Arc<D>) -> Result<Self> {
        info!("formatting the file system");
        if device.num_sectors() < NUM_SECTORS || device.sector_size() != SECTOR_SIZE {
            return Err(FsError::InvalidArgument(format!(
                "device has {} sectors of {} bytes, need {} of {}",
                device.num_sectors(),
                device.sector_size(),
                NUM_SECTORS,
                SECTOR_SIZE
            )));
        }

        let mut free_map = FreeMap::new(NUM_SECTORS);
        free_map.mark(FREE_MAP_SECTOR)?;
        free_map.mark(DIRECTORY_SECTOR)?;

        let mut map_hdr = FileHeader::EMPTY;
        let mut dir_hdr = FileHeader::EMPTY;
        map_hdr.allocate(&mut free_map, FREE_MAP_FILE_SIZE)?;
        dir_hdr.allocate(&mut free_map, DIRECTORY_FILE_SIZE)?;

        // Headers must be on disk before the files can be opened.
        debug!("writing headers back to disk");
        map_hdr.write_back(&*device, FREE_MAP_SECTOR)?;
        dir_hdr.write_back(&*device, DIRECTORY_SECTOR)?;

        let free_map_file = OpenFile::open(Arc::clone(&device), FREE_MAP_SECTOR)?;
        let directory_file = OpenFile::open(Arc::clone(&device), DIRECTORY_SECTOR)?;

        let root = Directory::formatted(NUM_DIR_ENTRIES, DIRECTORY_SECTOR, DIRECTORY_SECTOR)?;
        debug!("writing bitmap and directory back to disk");
        free_map.write_back(&free_map_file)?;
        root.write_back(&directory_file)?;
        device.flush()?;
        debug!("{}", free_map);

        Ok(Self::assemble(device, free_map_file, directory_file))
    }

    /// Opens the free map and root directory files of an already formatted
    /// device. On-disk state is trusted as is.
    pub fn mount(device: Arc<D>) -> Result<Self> {
        let free_map_file = OpenFile::open(Arc::clone(&device), FREE_MAP_SECTOR)?;
        let directory_file = OpenFile::open(Arc::clone(&device), DIRECTORY_SECTOR)?;
        info!("mounted the file system");
        Ok(Self::assemble(device, free_map_file, directory_file))
    }

    fn assemble(device: Arc<D>, free_map_file: OpenFile<D>, directory_file: OpenFile<D>) -> Self {
        Self {
            device,
            inner: Mutex::new(Inner {
                free_map_file,
                directory_file,
                open_files: OpenFileTable::new(MAX_OPEN_FILES),
            }),
        }
    }

    /// A session whose current directory is the root.
    pub fn session(&self) -> Session {
        Session::root()
    }

    /// Directory sector and final component of `path`, relative to the
    /// session's current directory.
    fn resolve_parent<'p>(&self, session: &Session, path: &'p str) -> Result<(u32, &'p str)> {
        let (dir_path, name) = path::split_parent(path)?;
        let dir_sector = path::resolve_dir(&self.device, session.current_directory(), dir_path)?;
        Ok((dir_sector, name))
    }

    /// Creates a regular file of `size` bytes. Sizes are fixed for life.
    pub fn create(&self, session: &Session, path: &str, size: usize) -> Result<()> {
        let inner = self.inner.lock();
        self.create_entry(&inner, session, path, FileType::Regular, size)
            .inspect_err(|e| warn!("create {:?} failed: {}", path, e))
    }

    /// Creates an empty directory holding "." and "..".
    pub fn create_directory(&self, session: &Session, path: &str) -> Result<()> {
        let inner = self.inner.lock();
        self.create_entry(&inner, session, path, FileType::Directory, DIRECTORY_FILE_SIZE)
            .inspect_err(|e| warn!("create directory {:?} failed: {}", path, e))
    }

    fn create_entry(
        &self,
        inner: &Inner<D>,
        session: &Session,
        path: &str,
        ftype: FileType,
        size: usize,
    ) -> Result<()> {
        let (parent_sector, name) = self.resolve_parent(session, path)?;
        let (parent_file, mut parent) = Directory::load(&self.device, parent_sector)?;
        if parent.find(name).is_some() {
            return Err(FsError::AlreadyExists(name.to_string()));
        }

        // Staged changes, nothing reaches the device until all of them succeed.
        let mut free_map = inner.load_free_map()?;
        let sector = free_map
            .find()
            .ok_or(FsError::CapacityExceeded(Capacity::NoFreeSector))?;
        parent.add(name, sector, ftype)?;
        let mut hdr = FileHeader::EMPTY;
        hdr.allocate(&mut free_map, size)?;
        let new_dir = match ftype {
            FileType::Directory => Some(Directory::formatted(NUM_DIR_ENTRIES, sector, parent_sector)?),
            FileType::Regular => None,
        };

        hdr.write_back(&*self.device, sector)?;
        if let Some(new_dir) = new_dir {
            let new_file = OpenFile::open(Arc::clone(&self.device), sector)?;
            new_dir.write_back(&new_file)?;
        }
        parent.write_back(&parent_file)?;
        free_map.write_back(&inner.free_map_file)?;

        info!("created {:?} at sector {} ({:?}, {} bytes)", path, sector, ftype, size);
        Ok(())
    }

    /// Opens `path`. Opening a file that is already open returns its
    /// existing handle, cursor included.
    pub fn open(&self, session: &Session, path: &str) -> Result<Handle> {
        let mut inner = self.inner.lock();
        let sector = self
            .lookup(session, path)
            .inspect_err(|e| warn!("open {:?} failed: {}", path, e))?;
        let device = Arc::clone(&self.device);
        inner
            .open_files
            .open(path, sector, || OpenFile::open(device, sector))
    }

    fn lookup(&self, session: &Session, path: &str) -> Result<u32> {
        let (dir_sector, name) = self.resolve_parent(session, path)?;
        let (_, dir) = Directory::load(&self.device, dir_sector)?;
        dir.find(name).ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    pub fn close(&self, handle: Handle) -> Result<()> {
        self.inner.lock().open_files.close(handle)
    }

    /// Closes every open handle. Returns how many were open.
    pub fn close_all(&self) -> usize {
        self.inner.lock().open_files.close_all()
    }

    pub fn is_valid_handle(&self, handle: Handle) -> bool {
        self.inner.lock().open_files.is_valid_handle(handle)
    }

    /// Reads at the handle's cursor, advancing it.
    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        self.inner.lock().open_files.read(handle, buf)
    }

    /// Writes at the handle's cursor, advancing it.
    pub fn write(&self, handle: Handle, buf: &[u8]) -> Result<usize> {
        self.inner.lock().open_files.write(handle, buf)
    }

    /// Reads at `position` without moving the cursor.
    pub fn read_at(&self, handle: Handle, buf: &mut [u8], position: usize) -> Result<usize> {
        self.inner.lock().open_files.read_at(handle, buf, position)
    }

    /// Writes at `position` without moving the cursor.
    pub fn write_at(&self, handle: Handle, buf: &[u8], position: usize) -> Result<usize> {
        self.inner.lock().open_files.write_at(handle, buf, position)
    }

    pub fn seek(&self, handle: Handle, position: usize) -> Result<()> {
        self.inner.lock().open_files.seek(handle, position)
    }

    pub fn tell(&self, handle: Handle) -> Result<usize> {
        self.inner.lock().open_files.tell(handle)
    }

    /// Removes `path`, releasing its header and data sectors.
    /// Neither open handles nor directory contents are checked first.
    pub fn remove(&self, session: &Session, path: &str) -> Result<()> {
        let inner = self.inner.lock();
        self.remove_entry(&inner, session, path)
            .inspect_err(|e| warn!("remove {:?} failed: {}", path, e))
    }

    fn remove_entry(&self, inner: &Inner<D>, session: &Session, path: &str) -> Result<()> {
        let (dir_sector, name) = self.resolve_parent(session, path)?;
        if name == DOT_NAME || name == DOTDOT_NAME {
            return Err(FsError::InvalidArgument(format!("cannot remove {:?}", name)));
        }
        let (dir_file, mut dir) = Directory::load(&self.device, dir_sector)?;
        let sector = dir
            .find(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        if inner.open_files.find_by_sector(sector).is_some() {
            warn!("removing {:?} while it is still open", path);
        }

        let hdr = FileHeader::fetch_from(&*self.device, sector)?;
        let mut free_map = inner.load_free_map()?;
        hdr.deallocate(&mut free_map)?;
        free_map.clear(sector)?;
        dir.remove(name)?;

        free_map.write_back(&inner.free_map_file)?;
        dir.write_back(&dir_file)?;
        info!("removed {:?} (sector {})", path, sector);
        Ok(())
    }

    /// Makes `path` the session's current directory. ".." walks up, "."
    /// stays put.
    pub fn change_directory(&self, session: &mut Session, path: &str) -> Result<()> {
        let _inner = self.inner.lock();
        if path.is_empty() {
            return Err(FsError::InvalidArgument(String::from("empty directory name")));
        }
        let sector = path::resolve_dir(&self.device, session.current_directory(), path)
            .inspect_err(|e| warn!("change directory to {:?} failed: {}", path, e))?;
        session.set_current_directory(sector);
        info!("changed to directory {:?} (sector {})", path, sector);
        Ok(())
    }

    /// Entries of the session's current directory.
    pub fn list(&self, session: &Session) -> Result<Vec<DirEntryInfo>> {
        let _inner = self.inner.lock();
        let (_, dir) = Directory::load(&self.device, session.current_directory())?;
        let entries = dir.list();
        for entry in &entries {
            debug!("{}", entry.name);
        }
        Ok(entries)
    }

    /// Dump of the free map header, the current directory's header, the free
    /// map and every entry of the current directory.
    pub fn print(&self, session: &Session) -> Result<String> {
        let inner = self.inner.lock();
        let current = session.current_directory();
        let mut out = String::from("Bit map file header:\n");
        out.push_str(&inner.free_map_file.header().print(&*self.device)?);
        out.push_str("Directory file header:\n");
        out.push_str(&FileHeader::fetch_from(&*self.device, current)?.print(&*self.device)?);
        out.push_str(&format!("{}\n", inner.load_free_map()?));
        let (_, dir) = Directory::load(&self.device, current)?;
        out.push_str(&dir.print(&*self.device)?);
        debug!("{}", out);
        Ok(out)
    }

    /// Number of sectors still free.
    pub fn free_sectors(&self) -> Result<usize> {
        Ok(self.inner.lock().load_free_map()?.num_clear())
    }

    /// Snapshot of the in-memory free map.
    pub fn free_map(&self) -> Result<FreeMap> {
        self.inner.lock().load_free_map()
    }

    pub fn open_files(&self) -> Vec<OpenFileInfo> {
        self.inner.lock().open_files.entries()
    }

    /// Reports every open file as about to be modified by `change`.
    pub fn touch_opened_files(&self, change: &str) -> Vec<OpenFileInfo> {
        let files = self.open_files();
        info!("touch opened files: {}", change);
        for file in &files {
            info!(" - '{}' (handle {}) would be modified", file.name, file.handle);
        }
        files
    }

    /// Root directory contents, read through the file kept open since
    /// bootstrap.
    pub fn root_entries(&self) -> Result<Vec<DirEntryInfo>> {
        let inner = self.inner.lock();
        let mut root = Directory::new(NUM_DIR_ENTRIES);
        root.fetch_from(&inner.directory_file)?;
        Ok(root.list())
    }

    pub fn sync(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
