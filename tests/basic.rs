mod common;

use std::sync::Arc;

use common::{formatted, RamDisk};
use tauon::{
    Capacity, Error, FileSystem, FileType, Handle, DIRECTORY_SECTOR, DOTDOT_NAME, DOT_NAME,
    MAX_FILE_SIZE, MAX_OPEN_FILES, NUM_SECTORS,
};

#[test]
fn test_format_root_lists_dot_entries() {
    let (_, fs) = formatted();
    let session = fs.session();
    let entries = fs.list(&session).unwrap();
    for entry in &entries {
        log!("Sector {} Name {}", entry.sector, entry.name);
    }
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, DOT_NAME);
    assert_eq!(entries[1].name, DOTDOT_NAME);
    assert!(entries.iter().all(|e| e.sector == DIRECTORY_SECTOR));
    assert!(entries.iter().all(|e| e.ftype == FileType::Directory));
}

#[test]
fn test_create_write_read() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "data", 300).unwrap();

    let h = fs.open(&session, "data").unwrap();
    let payload: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(fs.write(h, &payload).unwrap(), 300);
    fs.close(h).unwrap();

    let h = fs.open(&session, "data").unwrap();
    let mut buf = vec![0u8; 400];
    assert_eq!(fs.read(h, &mut buf).unwrap(), 300);
    assert_eq!(&buf[..300], &payload[..]);
    assert_eq!(fs.read(h, &mut buf).unwrap(), 0);
}

#[test]
fn test_create_max_size_file() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "big", MAX_FILE_SIZE).unwrap();
    let h = fs.open(&session, "big").unwrap();
    let payload = vec![0xabu8; MAX_FILE_SIZE];
    assert_eq!(fs.write(h, &payload).unwrap(), MAX_FILE_SIZE);
    let mut buf = vec![0u8; MAX_FILE_SIZE];
    assert_eq!(fs.read_at(h, &mut buf, 0).unwrap(), MAX_FILE_SIZE);
    assert_eq!(buf, payload);
}

#[test]
fn test_create_duplicate_fails() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "a", 100).unwrap();
    let before = fs.free_map().unwrap();
    let result = fs.create(&session, "a", 100);
    assert!(matches!(result, Err(Error::AlreadyExists(ref n)) if n == "a"));
    assert_eq!(fs.free_map().unwrap(), before);
}

#[test]
fn test_create_too_large_persists_nothing() {
    let (disk, fs) = formatted();
    let session = fs.session();
    let before = disk.snapshot();
    let result = fs.create(&session, "b", MAX_FILE_SIZE + 1);
    assert!(matches!(result, Err(Error::CapacityExceeded(Capacity::FileTooLarge))));
    assert_eq!(disk.snapshot(), before);
    assert!(fs.open(&session, "b").is_err());
}

#[test]
fn test_create_invalid_names() {
    let (disk, fs) = formatted();
    let session = fs.session();
    let before = disk.snapshot();
    assert!(matches!(fs.create(&session, "", 10), Err(Error::InvalidArgument(_))));
    assert!(matches!(fs.create(&session, "waytoolongname", 10), Err(Error::InvalidArgument(_))));
    assert_eq!(disk.snapshot(), before);
}

#[test]
fn test_create_until_disk_full() {
    let (disk, fs) = formatted();
    let mut session = fs.session();
    // Each directory holds 8 files; nest directories to get past that bound.
    let mut created = 0;
    let mut depth = 0;
    loop {
        let name = format!("f{}", created % 7);
        match fs.create(&session, &name, MAX_FILE_SIZE) {
            Ok(()) => created += 1,
            Err(Error::CapacityExceeded(Capacity::DirectoryFull)) => unreachable!(),
            Err(Error::CapacityExceeded(Capacity::NoFreeSector)) => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
        if created % 7 == 0 {
            let dir = format!("d{}", depth);
            fs.create_directory(&session, &dir).unwrap();
            fs.change_directory(&mut session, &dir).unwrap();
            depth += 1;
        }
    }
    log!("created {} files across {} directories", created, depth);
    assert!(fs.free_sectors().unwrap() < 31);
    // A failed create leaves the disk exactly as it was.
    let before = disk.snapshot();
    assert!(fs.create(&session, "x", MAX_FILE_SIZE).is_err());
    assert_eq!(disk.snapshot(), before);
}

#[test]
fn test_open_missing_consumes_no_slot() {
    let (_, fs) = formatted();
    let session = fs.session();
    let result = fs.open(&session, "missing");
    assert!(matches!(result, Err(Error::NotFound(ref n)) if n == "missing"));
    assert!(fs.open_files().is_empty());
}

#[test]
fn test_reopen_returns_same_handle() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "shared", 20).unwrap();
    let h1 = fs.open(&session, "shared").unwrap();
    assert_eq!(fs.write(h1, b"0123456789").unwrap(), 10);
    let h2 = fs.open(&session, "shared").unwrap();
    assert_eq!(h1, h2);
    assert_eq!(fs.open_files().len(), 1);
    // The cursor is shared.
    assert_eq!(fs.tell(h2).unwrap(), 10);
}

#[test]
fn test_open_table_full() {
    let (_, fs) = formatted();
    let mut session = fs.session();
    let mut handles = Vec::new();
    // Spread files over two directories since each holds 8 entries.
    for i in 0..MAX_OPEN_FILES + 1 {
        if i == 6 {
            fs.create_directory(&session, "more").unwrap();
            fs.change_directory(&mut session, "more").unwrap();
        }
        let name = format!("f{}", i);
        fs.create(&session, &name, 10).unwrap();
        if i < MAX_OPEN_FILES {
            handles.push(fs.open(&session, &name).unwrap());
        } else {
            let result = fs.open(&session, &name);
            assert!(matches!(result, Err(Error::CapacityExceeded(Capacity::OpenFileTableFull))));
        }
    }
    assert_eq!(fs.open_files().len(), MAX_OPEN_FILES);
    fs.close(handles[3]).unwrap();
    let last = format!("f{}", MAX_OPEN_FILES);
    assert_eq!(fs.open(&session, &last).unwrap(), handles[3]);
}

#[test]
fn test_invalid_handles() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "a", 10).unwrap();
    let h = fs.open(&session, "a").unwrap();
    fs.close(h).unwrap();

    let mut buf = [0u8; 4];
    assert!(matches!(fs.close(h), Err(Error::InvalidHandle(_))));
    assert!(matches!(fs.read(h, &mut buf), Err(Error::InvalidHandle(_))));
    assert!(matches!(fs.write(h, b"abcd"), Err(Error::InvalidHandle(_))));
    assert!(matches!(fs.read_at(h, &mut buf, 0), Err(Error::InvalidHandle(_))));
    assert!(matches!(fs.write_at(h, b"abcd", 0), Err(Error::InvalidHandle(_))));
    assert!(!fs.is_valid_handle(Handle::from_raw(MAX_OPEN_FILES)));
}

#[test]
fn test_positional_io_leaves_cursor() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "pos", 256).unwrap();
    let h = fs.open(&session, "pos").unwrap();

    assert_eq!(fs.write_at(h, b"tail", 252).unwrap(), 4);
    assert_eq!(fs.write_at(h, b"overflow", 254).unwrap(), 2);
    assert_eq!(fs.tell(h).unwrap(), 0);

    assert_eq!(fs.write(h, b"head").unwrap(), 4);
    let mut buf = [0u8; 4];
    assert_eq!(fs.read_at(h, &mut buf, 252).unwrap(), 4);
    assert_eq!(&buf, b"taov");
    assert_eq!(fs.tell(h).unwrap(), 4);

    fs.seek(h, 0).unwrap();
    assert_eq!(fs.read(h, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"head");
    // Across a sector boundary.
    assert_eq!(fs.write_at(h, b"spans", 126).unwrap(), 5);
    let mut five = [0u8; 5];
    assert_eq!(fs.read_at(h, &mut five, 126).unwrap(), 5);
    assert_eq!(&five, b"spans");
}

#[test]
fn test_create_remove_restores_free_map() {
    let (_, fs) = formatted();
    let session = fs.session();
    let before = fs.free_map().unwrap();
    fs.create(&session, "tmp", 1000).unwrap();
    assert_eq!(fs.free_sectors().unwrap(), before.num_clear() - 1 - 8);
    fs.remove(&session, "tmp").unwrap();
    assert_eq!(fs.free_map().unwrap(), before);
    assert_eq!(fs.list(&session).unwrap().len(), 2);
}

#[test]
fn test_remove_missing() {
    let (disk, fs) = formatted();
    let session = fs.session();
    let before = disk.snapshot();
    assert!(matches!(fs.remove(&session, "ghost"), Err(Error::NotFound(_))));
    assert_eq!(disk.snapshot(), before);
}

#[test]
fn test_remove_then_recreate() {
    let (_, fs) = formatted();
    let session = fs.session();
    for i in 0..5 {
        fs.create(&session, &format!("file{}", i), 64).unwrap();
    }
    fs.remove(&session, "file2").unwrap();
    fs.create(&session, "file2", 128).unwrap();
    let names: Vec<String> = fs.list(&session).unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names.len(), 7);
    assert!(names.contains(&"file2".to_string()));
}

#[test]
fn test_create_directory_links() {
    let (_, fs) = formatted();
    let mut session = fs.session();
    fs.create_directory(&session, "sub").unwrap();

    let root_entries = fs.list(&session).unwrap();
    let sub = root_entries.iter().find(|e| e.name == "sub").unwrap();
    assert_eq!(sub.ftype, FileType::Directory);

    fs.change_directory(&mut session, "sub").unwrap();
    assert_eq!(session.current_directory(), sub.sector);
    let entries = fs.list(&session).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, DOT_NAME);
    assert_eq!(entries[0].sector, sub.sector);
    assert_eq!(entries[1].name, DOTDOT_NAME);
    assert_eq!(entries[1].sector, DIRECTORY_SECTOR);

    fs.change_directory(&mut session, "..").unwrap();
    assert_eq!(session.current_directory(), DIRECTORY_SECTOR);
    fs.change_directory(&mut session, "sub").unwrap();
    assert_eq!(session.current_directory(), sub.sector);
    fs.change_directory(&mut session, ".").unwrap();
    assert_eq!(session.current_directory(), sub.sector);
}

#[test]
fn test_root_parent_is_root() {
    let (_, fs) = formatted();
    let mut session = fs.session();
    fs.change_directory(&mut session, "..").unwrap();
    assert_eq!(session.current_directory(), DIRECTORY_SECTOR);
}

#[test]
fn test_change_directory_errors() {
    let (_, fs) = formatted();
    let mut session = fs.session();
    fs.create(&session, "plain", 10).unwrap();
    assert!(matches!(fs.change_directory(&mut session, "plain"), Err(Error::NotDirectory(_))));
    assert!(matches!(fs.change_directory(&mut session, "nowhere"), Err(Error::NotFound(_))));
    assert!(matches!(fs.change_directory(&mut session, ""), Err(Error::InvalidArgument(_))));
    assert_eq!(session.current_directory(), DIRECTORY_SECTOR);
}

#[test]
fn test_same_name_in_different_directories() {
    let (_, fs) = formatted();
    let mut session = fs.session();
    fs.create(&session, "dup", 10).unwrap();
    fs.create_directory(&session, "dir").unwrap();
    fs.change_directory(&mut session, "dir").unwrap();
    fs.create(&session, "dup", 10).unwrap();

    let inner = fs.open(&session, "dup").unwrap();
    fs.write(inner, b"inner!").unwrap();
    fs.change_directory(&mut session, "..").unwrap();
    let outer = fs.open(&session, "dup").unwrap();
    assert_ne!(inner, outer);
    let mut buf = [0u8; 6];
    fs.read(outer, &mut buf).unwrap();
    assert_eq!(buf, [0u8; 6]);
}

#[test]
fn test_multi_component_paths() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create_directory(&session, "a").unwrap();
    fs.create_directory(&session, "a/b").unwrap();
    fs.create(&session, "a/b/c", 50).unwrap();

    let h = fs.open(&session, "/a/b/c").unwrap();
    fs.write(h, b"deep").unwrap();
    fs.close(h).unwrap();

    let mut nested = fs.session();
    fs.change_directory(&mut nested, "a/b").unwrap();
    let names: Vec<String> = fs.list(&nested).unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec![".", "..", "c"]);

    let h = fs.open(&nested, "c").unwrap();
    let mut buf = [0u8; 4];
    fs.read(h, &mut buf).unwrap();
    assert_eq!(&buf, b"deep");

    fs.change_directory(&mut nested, "../..").unwrap();
    assert_eq!(nested.current_directory(), DIRECTORY_SECTOR);

    assert!(matches!(fs.open(&session, "a/b/c/d"), Err(Error::NotDirectory(_))));
    assert!(matches!(fs.create(&session, "a/x/y", 1), Err(Error::NotFound(_))));
    fs.remove(&session, "a/b/c").unwrap();
    assert!(fs.open(&session, "a/b/c").is_err());
}

#[test]
fn test_remove_open_file_keeps_stale_handle() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "open", 10).unwrap();
    let h = fs.open(&session, "open").unwrap();
    fs.remove(&session, "open").unwrap();
    assert!(fs.is_valid_handle(h));
    assert_eq!(fs.touch_opened_files("rm open").len(), 1);
    assert_eq!(fs.close_all(), 1);
    assert!(!fs.is_valid_handle(h));
}

#[test]
fn test_format_requires_full_device() {
    let result = FileSystem::format(Arc::new(RamDisk::new(NUM_SECTORS / 2)));
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_print_dump() {
    let (_, fs) = formatted();
    let session = fs.session();
    fs.create(&session, "readme", 12).unwrap();
    let h = fs.open(&session, "readme").unwrap();
    fs.write(h, b"hello tauon\n").unwrap();
    let dump = fs.print(&session).unwrap();
    log!("{}", dump);
    assert!(dump.contains("Directory file header"));
    assert!(dump.contains("hello tauon\\a"));
}
