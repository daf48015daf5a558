//! Archive module: the on-disk encrypted form of a vault.
//!
//! This module provides:
//! - The JSON archive document and its codec (`format`)
//! - Permission bits stored with each file (`permissions`)
//! - Content hashing for the unmount dirty check (`hasher`)
//! - Backup-and-restore around archive rewrites (`backup`)

pub mod backup;
pub mod format;
pub mod hasher;
pub mod permissions;

// Re-export the most commonly used items.
pub use backup::{with_backup, BackupGuard};
pub use format::{ArchiveEntry, ArchiveMetadata, ArchivePackage, ArchiveSummary};
pub use hasher::{hash_directory, has_changed, tracked_files, TrackedFile, HASH_MARKER};
