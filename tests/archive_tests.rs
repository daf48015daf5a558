//! Integration tests for the archive document, directory hashing, and
//! backup handling.

use std::collections::BTreeMap;
use std::fs;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use secrets_vault::archive::hasher::{self, HASH_MARKER};
use secrets_vault::archive::{with_backup, ArchiveEntry, ArchivePackage, BackupGuard};
use secrets_vault::errors::{Result, VaultError};

fn sample_package() -> ArchivePackage {
    let mut files = BTreeMap::new();
    files.insert(
        "z.txt".to_string(),
        ArchiveEntry {
            content: vec![1, 2, 3],
            permissions: "600".into(),
        },
    );
    files.insert(
        "a/b.env".to_string(),
        ArchiveEntry {
            content: b"ciphertext".to_vec(),
            permissions: "644".into(),
        },
    );
    ArchivePackage::new(
        "demo",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        &[0u8; 32],
        100_000,
        files,
    )
}

// ---------------------------------------------------------------------------
// Document format
// ---------------------------------------------------------------------------

#[test]
fn document_is_sorted_indented_and_newline_terminated() {
    let doc = sample_package().to_document().unwrap();

    assert!(doc.starts_with("{\n  \"files\": {\n"));
    assert!(doc.ends_with("}\n"));

    let files_at = doc.find("\"files\"").unwrap();
    let metadata_at = doc.find("\"metadata\"").unwrap();
    assert!(files_at < metadata_at);

    let a_at = doc.find("\"a/b.env\"").unwrap();
    let z_at = doc.find("\"z.txt\"").unwrap();
    assert!(a_at < z_at);

    let created_at = doc.find("\"created\"").unwrap();
    let salt_at = doc.find("\"salt\"").unwrap();
    let version_at = doc.find("\"version\"").unwrap();
    assert!(created_at < salt_at && salt_at < version_at);
}

#[test]
fn binary_fields_are_standard_base64() {
    let doc = sample_package().to_document().unwrap();
    // 32 zero bytes
    assert!(doc.contains("\"salt\": \"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=\""));
    assert!(doc.contains("\"content\": \"AQID\""));
}

#[test]
fn document_parses_back() {
    let package = sample_package();
    let parsed = ArchivePackage::from_document(&package.to_document().unwrap()).unwrap();
    assert_eq!(parsed, package);
    assert_eq!(parsed.summary().file_count, 2);
}

#[test]
fn archive_without_iterations_still_parses() {
    let doc = r#"{
  "files": {},
  "metadata": {
    "created": "2024-01-01T00:00:00Z",
    "project": "legacy",
    "salt": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
    "version": "1.0.0"
  }
}
"#;
    let package = ArchivePackage::from_document(doc).unwrap();
    assert_eq!(package.metadata.iterations, None);
    assert_eq!(package.metadata.project, "legacy");
}

#[test]
fn missing_files_key_is_a_format_error() {
    let doc = r#"{"metadata": {"created": "2024-01-01T00:00:00Z", "project": "x", "salt": "", "version": "1"}}"#;
    match ArchivePackage::from_document(doc) {
        Err(VaultError::FormatError(msg)) => assert!(msg.contains("files")),
        other => panic!("expected FormatError, got {other:?}"),
    }
}

#[test]
fn bad_base64_is_a_format_error() {
    let doc = r#"{
  "files": {"a": {"content": "!!!", "permissions": "600"}},
  "metadata": {"created": "2024-01-01T00:00:00Z", "project": "x", "salt": "", "version": "1"}
}"#;
    assert!(matches!(
        ArchivePackage::from_document(doc),
        Err(VaultError::FormatError(_))
    ));
}

#[test]
fn path_traversal_entries_are_rejected() {
    for key in ["../escape", "/etc/passwd", "a/../../b", "a//b", "./a"] {
        let doc = format!(
            r#"{{"files": {{"{key}": {{"content": "", "permissions": "600"}}}},
"metadata": {{"created": "2024-01-01T00:00:00Z", "project": "x", "salt": "", "version": "1"}}}}"#
        );
        assert!(
            matches!(ArchivePackage::from_document(&doc), Err(VaultError::FormatError(_))),
            "{key} was accepted"
        );
    }
}

#[test]
fn reading_a_missing_archive_reports_it() {
    let dir = TempDir::new().unwrap();
    let result = ArchivePackage::read(&dir.path().join(".nope.secrets"));
    assert!(matches!(result, Err(VaultError::ArchiveMissing(_))));
}

// ---------------------------------------------------------------------------
// Directory hashing
// ---------------------------------------------------------------------------

#[test]
fn hash_is_stable_and_ignores_marker() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "A=1").unwrap();
    fs::create_dir(dir.path().join("certs")).unwrap();
    fs::write(dir.path().join("certs/key.pem"), "-----BEGIN-----").unwrap();

    let first = hasher::hash_secrets_dir(dir.path()).unwrap();
    fs::write(dir.path().join(HASH_MARKER), "something else\n").unwrap();
    let second = hasher::hash_secrets_dir(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn hash_changes_with_content_or_name() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "one").unwrap();
    let base = hasher::hash_secrets_dir(dir.path()).unwrap();

    fs::write(dir.path().join("a.txt"), "two").unwrap();
    let edited = hasher::hash_secrets_dir(dir.path()).unwrap();
    assert_ne!(base, edited);

    fs::rename(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
    let renamed = hasher::hash_secrets_dir(dir.path()).unwrap();
    assert_ne!(edited, renamed);
}

#[test]
fn missing_directory_hashes_to_empty_string() {
    let dir = TempDir::new().unwrap();
    assert_eq!(hasher::hash_secrets_dir(&dir.path().join("absent")).unwrap(), "");
}

#[test]
fn baseline_tracks_changes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "A=1").unwrap();
    assert!(hasher::has_changed(dir.path()));

    let digest = hasher::store_baseline(dir.path()).unwrap();
    assert_eq!(hasher::stored_hash(dir.path()), Some(digest));
    assert!(!hasher::has_changed(dir.path()));

    fs::write(dir.path().join("new.key"), "k").unwrap();
    assert!(hasher::has_changed(dir.path()));
}

#[test]
fn tracked_files_are_sorted_posix_paths() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("b/c")).unwrap();
    fs::write(dir.path().join("b/c/d.txt"), "").unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join(HASH_MARKER), "").unwrap();

    let names: Vec<String> = hasher::tracked_files(dir.path(), &[HASH_MARKER])
        .unwrap()
        .into_iter()
        .map(|f| f.relative)
        .collect();
    assert_eq!(names, vec!["a.txt", "b/c/d.txt"]);
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

#[test]
fn failed_rewrite_keeps_previous_archive() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(".demo.secrets");
    sample_package().write(&target).unwrap();
    let before = fs::read(&target).unwrap();

    let result: Result<()> = with_backup(&target, |path| {
        fs::write(path, "{ truncated")?;
        Err(VaultError::EncryptionFailed("simulated".into()))
    });

    assert!(result.is_err());
    assert_eq!(fs::read(&target).unwrap(), before);
    assert!(!BackupGuard::backup_path(&target).exists());
}

#[test]
fn successful_rewrite_leaves_no_backup() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(".demo.secrets");
    fs::write(&target, "old").unwrap();

    with_backup(&target, |path| sample_package().write(path)).unwrap();

    assert!(ArchivePackage::read(&target).is_ok());
    assert!(!BackupGuard::backup_path(&target).exists());
}

#[test]
fn failed_first_write_leaves_no_archive() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(".demo.secrets");

    let result: Result<()> = with_backup(&target, |path| {
        fs::write(path, "partial")?;
        Err(VaultError::EncryptionFailed("simulated".into()))
    });

    assert!(result.is_err());
    assert!(!target.exists());
}
