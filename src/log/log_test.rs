use super::*;

use tempfile::tempdir;

#[test]
fn test_open_fresh_log_initializes_checkpoint() {
    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    let mut log = Log::open(&loc, true).unwrap();
    let root = log.read_checkpoint().unwrap();
    let record = log.read(root).unwrap();
    assert!(record.len() > 0);
}

#[test]
fn test_append_then_read_back() {
    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    let mut log = Log::open(&loc, true).unwrap();

    let offset = log.append(b"hello world").unwrap();
    let got = log.read(offset).unwrap();
    assert_eq!(got, b"hello world");
}

#[test]
fn test_write_checkpoint_then_read_checkpoint() {
    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    let mut log = Log::open(&loc, true).unwrap();

    let offset = log.append(b"payload").unwrap();
    log.write_checkpoint(offset).unwrap();
    assert_eq!(log.read_checkpoint().unwrap(), offset);
}

#[test]
fn test_reopen_existing_log_preserves_checkpoint() {
    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    let offset = {
        let mut log = Log::open(&loc, true).unwrap();
        let offset = log.append(b"payload").unwrap();
        log.write_checkpoint(offset).unwrap();
        offset
    };
    let mut log = Log::open(&loc, true).unwrap();
    assert_eq!(log.read_checkpoint().unwrap(), offset);
}

#[test]
fn test_detects_torn_checkpoint_header() {
    use std::io::{Seek, SeekFrom, Write};

    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    {
        let _log = Log::open(&loc, true).unwrap();
    }

    let mut fd = std::fs::OpenOptions::new().write(true).open(&loc).unwrap();
    fd.seek(SeekFrom::Start(HEADER_OFFSET_1)).unwrap();
    fd.write_all(&9999_u32.to_be_bytes()).unwrap();
    fd.sync_all().unwrap();

    let mut log = Log::open(&loc, true).unwrap();
    assert!(log.read_checkpoint().is_err());
}

#[test]
fn test_multiple_appends_are_length_framed() {
    let dir = tempdir().unwrap();
    let loc = dir.path().join("t1.index").into_os_string();
    let mut log = Log::open(&loc, true).unwrap();

    let o1 = log.append(b"one").unwrap();
    let o2 = log.append(b"two-longer").unwrap();
    let o3 = log.append(b"3").unwrap();

    assert_eq!(log.read(o1).unwrap(), b"one");
    assert_eq!(log.read(o2).unwrap(), b"two-longer");
    assert_eq!(log.read(o3).unwrap(), b"3");
}
