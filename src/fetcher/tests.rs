use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::path::sanitize;
use super::{extract_archive, FetchError};

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_sanitize_accepts_normal_paths() {
    assert_eq!(sanitize("src/lib.rs").unwrap(), "src/lib.rs");
    assert_eq!(sanitize("./src/./main.rs").unwrap(), "src/main.rs");
    assert_eq!(sanitize("README.md").unwrap(), "README.md");
}

#[test]
fn test_sanitize_rejects_traversal() {
    assert!(matches!(
        sanitize("../etc/passwd"),
        Err(FetchError::InvalidPath(_))
    ));
    assert!(matches!(
        sanitize("src/../../escape"),
        Err(FetchError::InvalidPath(_))
    ));
}

#[test]
fn test_sanitize_rejects_absolute_and_empty_paths() {
    assert!(matches!(
        sanitize("/etc/passwd"),
        Err(FetchError::InvalidPath(_))
    ));
    assert!(matches!(sanitize(""), Err(FetchError::InvalidPath(_))));
    assert!(matches!(sanitize("."), Err(FetchError::InvalidPath(_))));
}

#[test]
fn test_extract_strips_the_top_level_directory() {
    let bytes = build_zip(&[
        ("repo-main/README.md", "# readme"),
        ("repo-main/src/lib.rs", "pub fn f() {}"),
        ("repo-main/src/nested/deep.rs", "mod deep {}"),
    ]);

    let dir = tempfile::tempdir().unwrap();
    extract_archive(&bytes, dir.path()).unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
        "# readme"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/lib.rs")).unwrap(),
        "pub fn f() {}"
    );
    assert!(dir.path().join("src/nested/deep.rs").exists());
    assert!(!dir.path().join("repo-main").exists());
}

#[test]
fn test_extract_rejects_traversal_entries() {
    let bytes = build_zip(&[("repo-main/../outside.txt", "nope")]);

    let dir = tempfile::tempdir().unwrap();
    let err = extract_archive(&bytes, dir.path()).unwrap_err();
    assert!(matches!(err, FetchError::InvalidPath(_)));
}

#[test]
fn test_extract_rejects_an_empty_archive() {
    let bytes = build_zip(&[]);

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        extract_archive(&bytes, dir.path()),
        Err(FetchError::Archive(_))
    ));
}
