//! End-to-end tests driving a `Session` against synthetic FAT32 images.

mod common;

use common::{ARCHIVE, DIRECTORY, Image, entry, sample_image, scratch_dir};
use fat_navigator::{FATError, Session, SessionConfig, SessionError};
use std::fs;
use std::path::Path;

fn open_sample(test_name: &str) -> Session {
    let path = sample_image().save(test_name);
    let mut session = Session::new(SessionConfig {
        output_dir: path.parent().unwrap().to_path_buf(),
        ..SessionConfig::default()
    });
    session.open(&path).unwrap();
    session
}

fn names(session: &Session, target: Option<&str>) -> Vec<String> {
    session
        .ls(target)
        .unwrap()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[test]
fn get_writes_exact_file_content() {
    let mut image = Image::new(4);
    image.write_dir(2, &[entry(b"HELLO   TXT", ARCHIVE, 3, 5)]);
    image.chain(&[3]);
    image.write_cluster(3, b"HELLO, with trailing bytes");
    let path = image.save("get_writes_exact_file_content");

    let out_dir = path.parent().unwrap().to_path_buf();
    let mut session = Session::new(SessionConfig {
        output_dir: out_dir.clone(),
        ..SessionConfig::default()
    });
    session.open(&path).unwrap();

    let written = session.get("HELLO.TXT").unwrap();

    assert_eq!(written, out_dir.join("HELLO.TXT"));
    assert_eq!(fs::read(&written).unwrap(), b"HELLO");
}

#[test]
fn read_byte_ranges() {
    let mut session = open_sample("read_byte_ranges");

    assert_eq!(session.read("HELLO.TXT", 1, 3).unwrap(), b"ELL");
    assert_eq!(session.read("hello.txt", 0, 5).unwrap(), b"HELLO");
    assert!(matches!(
        session.read("HELLO.TXT", 3, 10),
        Err(SessionError::FAT(FATError::RangeOutOfBounds { .. }))
    ));
    assert!(matches!(
        session.read("MISSING.TXT", 0, 1),
        Err(SessionError::FAT(FATError::NameNotFound(_)))
    ));
}

#[test]
fn ls_hides_deleted_and_hidden_entries() {
    let session = open_sample("ls_hides_deleted_and_hidden_entries");

    assert_eq!(names(&session, None), vec!["HELLO   TXT", "DOCS       "]);
    assert_eq!(names(&session, Some(".")), vec!["HELLO   TXT", "DOCS       "]);
    assert!(matches!(
        session.ls(Some("..")),
        Err(SessionError::AlreadyAtRoot)
    ));
    assert!(matches!(
        session.ls(Some("DOCS")),
        Err(SessionError::InvalidArguments(_))
    ));
}

#[test]
fn ls_of_empty_directory() {
    let path = Image::new(4).save("ls_of_empty_directory");
    let mut session = Session::new(SessionConfig::default());
    session.open(&path).unwrap();

    assert!(session.ls(None).unwrap().is_empty());
}

#[test]
fn cd_descends_and_ascends() {
    let mut session = open_sample("cd_descends_and_ascends");

    session.cd("docs").unwrap();
    assert_eq!(session.depth(), Some(2));
    assert_eq!(session.current_path().unwrap(), "/DOCS");
    assert_eq!(
        names(&session, None),
        vec![".          ", "..         ", "NOTES   TXT", "SUB        "]
    );
    assert_eq!(names(&session, Some("..")), vec!["HELLO   TXT", "DOCS       "]);

    session.cd(".").unwrap();
    assert_eq!(session.depth(), Some(2));

    session.cd("SUB").unwrap();
    assert_eq!(session.current_path().unwrap(), "/DOCS/SUB");

    session.cd("..").unwrap();
    session.cd("..").unwrap();
    assert_eq!(session.depth(), Some(1));
    assert_eq!(names(&session, None), vec!["HELLO   TXT", "DOCS       "]);
}

#[test]
fn cd_paths() {
    let mut session = open_sample("cd_paths");

    session.cd("DOCS/SUB").unwrap();
    assert_eq!(session.depth(), Some(3));

    session.cd("/").unwrap();
    assert_eq!(session.depth(), Some(1));

    session.cd("DOCS/SUB/../..").unwrap();
    assert_eq!(session.depth(), Some(1));
}

#[test]
fn failed_cd_keeps_the_stack() {
    let mut session = open_sample("failed_cd_keeps_the_stack");

    assert!(matches!(session.cd(".."), Err(SessionError::AlreadyAtRoot)));
    assert_eq!(session.depth(), Some(1));

    assert!(matches!(
        session.cd("NOPE"),
        Err(SessionError::InvalidDirectoryTarget(_))
    ));
    assert!(matches!(
        session.cd("HELLO.TXT"),
        Err(SessionError::InvalidDirectoryTarget(_))
    ));

    session.cd("DOCS").unwrap();
    assert!(matches!(
        session.cd("SUB/MISSING"),
        Err(SessionError::InvalidDirectoryTarget(_))
    ));
    assert_eq!(session.current_path().unwrap(), "/DOCS");
}

#[test]
fn multi_cluster_file_in_subdirectory() {
    let mut session = open_sample("multi_cluster_file_in_subdirectory");
    session.cd("DOCS").unwrap();

    let written = session.get("NOTES.TXT").unwrap();
    let data = fs::read(written).unwrap();

    assert_eq!(data.len(), 600);
    assert!(data[..512].iter().all(|b| *b == b'n'));
    assert!(data[512..].iter().all(|b| *b == b'm'));
    assert_eq!(session.read("NOTES.TXT", 510, 4).unwrap(), b"nnmm");
}

#[test]
fn get_rejects_directories() {
    let mut session = open_sample("get_rejects_directories");

    assert!(matches!(
        session.get("DOCS"),
        Err(SessionError::FAT(FATError::IsDirectory(_)))
    ));
}

#[test]
fn stat_reports_entry() {
    let session = open_sample("stat_reports_entry");

    let hello = session.stat("HELLO.TXT").unwrap();
    assert_eq!(hello.first_cluster(), 3);
    assert_eq!(*hello.file_size(), 5);
    assert_eq!(hello.attr().to_string(), "archive flag");

    let docs = session.stat("DOCS").unwrap();
    assert!(docs.is_dir());

    // Hidden entries are found, only listings leave them out
    assert!(session.stat("SECRET.TXT").is_ok());
    assert!(matches!(
        session.stat("OLD.TXT"),
        Err(SessionError::FAT(FATError::NameNotFound(_)))
    ));
    assert!(matches!(
        session.stat("muchtoolong.txt"),
        Err(SessionError::FAT(FATError::NameTooLong(_)))
    ));
}

#[test]
fn info_and_volume() {
    let session = open_sample("info_and_volume");

    let bpb = session.info().unwrap();
    assert_eq!(*bpb.bytes_per_sec(), 512);
    assert_eq!(*bpb.sec_per_clus(), 1);
    assert_eq!(*bpb.rsvd_sec_cnt(), 1);
    assert_eq!(*bpb.num_fat(), 1);
    assert_eq!(*bpb.fat_sz_32(), 1);
    assert!(bpb.to_string().contains("BPB_BytsPerSec"));

    assert!(matches!(
        session.volume(),
        Err(SessionError::VolumeLabelNotSet)
    ));
}

#[test]
fn volume_label_is_read_at_offset_43() {
    let mut image = Image::new(4);
    image.bytes[43] = b'V';
    // The label field overlaps the root cluster field: keep cluster 2 but end the text there
    let path = image.save("volume_label_is_read_at_offset_43");
    let mut session = Session::new(SessionConfig::default());
    session.open(&path).unwrap();

    assert_eq!(session.volume().unwrap(), "V\u{2}");
}

#[test]
fn lifecycle() {
    let path = sample_image().save("lifecycle");
    let mut session = Session::new(SessionConfig::default());

    assert!(matches!(session.ls(None), Err(SessionError::NotOpen)));
    assert!(matches!(session.info(), Err(SessionError::NotOpen)));
    assert!(matches!(session.close(), Err(SessionError::NotOpen)));

    session.open(&path).unwrap();
    session.cd("DOCS").unwrap();
    assert!(matches!(session.open(&path), Err(SessionError::AlreadyOpen)));
    // The failed open left the session untouched
    assert_eq!(session.current_path().unwrap(), "/DOCS");

    session.close().unwrap();
    assert!(!session.is_open());
    assert!(matches!(session.cd("DOCS"), Err(SessionError::NotOpen)));

    session.open(&path).unwrap();
    assert_eq!(session.depth(), Some(1));
}

#[test]
fn open_failures_leave_session_closed() {
    let dir = scratch_dir("open_failures_leave_session_closed");
    let mut session = Session::new(SessionConfig::default());

    assert!(matches!(
        session.open(&dir.join("missing.img")),
        Err(SessionError::ImageNotFound(_))
    ));
    assert!(!session.is_open());

    let tiny = dir.join("tiny.img");
    fs::write(&tiny, [0u8; 30]).unwrap();
    assert!(matches!(
        session.open(&tiny),
        Err(SessionError::FAT(FATError::ImageTooSmall))
    ));
    assert!(!session.is_open());

    let mut zero = Image::new(4);
    zero.bytes[13] = 0;
    let zero_path = zero.save("open_failures_zero_geometry");
    assert!(matches!(
        session.open(Path::new(&zero_path)),
        Err(SessionError::FAT(FATError::InvalidGeometry(_)))
    ));
    assert!(!session.is_open());
}

#[test]
fn unreadable_image_is_not_fatal() {
    let dir = scratch_dir("unreadable_image_is_not_fatal");
    let mut session = Session::new(SessionConfig::default());

    let err = session.open(&dir).unwrap_err();

    assert!(matches!(err, SessionError::ImageUnreadable { .. }));
    assert!(!err.is_fatal());
    assert!(!session.is_open());
}

#[test]
fn cd_into_directory_without_cluster() {
    let mut image = Image::new(4);
    image.write_dir(2, &[entry(b"BROKEN     ", DIRECTORY, 0, 0)]);
    let path = image.save("cd_into_directory_without_cluster");
    let mut session = Session::new(SessionConfig::default());
    session.open(&path).unwrap();

    assert!(matches!(
        session.cd("BROKEN"),
        Err(SessionError::FAT(FATError::InvalidCluster(0)))
    ));
    assert_eq!(session.depth(), Some(1));
}

#[test]
fn looping_chain_is_reported() {
    let mut image = Image::new(8);
    image.write_dir(2, &[entry(b"LOOP    BIN", ARCHIVE, 3, 2048)]);
    image.set_fat(3, 4);
    image.set_fat(4, 3);
    let path = image.save("looping_chain_is_reported");
    let mut session = Session::new(SessionConfig {
        output_dir: path.parent().unwrap().to_path_buf(),
        ..SessionConfig::default()
    });
    session.open(&path).unwrap();

    assert!(matches!(
        session.get("LOOP.BIN"),
        Err(SessionError::FAT(FATError::CorruptChain(_)))
    ));
}
