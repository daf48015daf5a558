//! Scoped backup around in-place archive rewrites.
//!
//! `BackupGuard::begin` copies the archive to `<archive>.backup`.  If the
//! guard is dropped before `commit`, the backup is moved back over the
//! archive (or, when there was nothing to back up, the half-written file
//! is removed).  `commit` deletes the backup.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::Result;

/// Suffix appended to the archive file name for its backup.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Restores the previous archive unless committed.
#[derive(Debug)]
pub struct BackupGuard {
    target: PathBuf,
    backup: Option<PathBuf>,
    armed: bool,
}

impl BackupGuard {
    /// Path of the backup file for `target`.
    pub fn backup_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(BACKUP_SUFFIX);
        target.with_file_name(name)
    }

    /// Back up `target` (if it exists) before it is overwritten.
    pub fn begin(target: &Path) -> Result<Self> {
        let backup = if target.exists() {
            let backup = Self::backup_path(target);
            fs::copy(target, &backup)?;
            debug!(backup = %backup.display(), "created archive backup");
            Some(backup)
        } else {
            None
        };

        Ok(Self {
            target: target.to_path_buf(),
            backup,
            armed: true,
        })
    }

    /// Whether an existing archive was backed up.
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Keep the new archive and discard the backup.
    pub fn commit(mut self) {
        self.armed = false;
        if let Some(backup) = &self.backup {
            if let Err(e) = fs::remove_file(backup) {
                warn!(backup = %backup.display(), error = %e, "could not remove archive backup");
            }
        }
    }

    fn restore(&self) -> std::io::Result<()> {
        match &self.backup {
            Some(backup) => fs::rename(backup, &self.target),
            None if self.target.exists() => fs::remove_file(&self.target),
            None => Ok(()),
        }
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.restore() {
            Ok(()) if self.backup.is_some() => {
                info!(archive = %self.target.display(), "restored archive from backup")
            }
            Ok(()) => {}
            Err(e) => {
                warn!(archive = %self.target.display(), error = %e, "could not restore archive backup")
            }
        }
    }
}

/// Run `write` against `target` under a `BackupGuard`.
///
/// On error the previous archive is back in place before the error is
/// returned.
pub fn with_backup<T>(target: &Path, write: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let guard = BackupGuard::begin(target)?;
    let value = write(target)?;
    guard.commit();
    Ok(value)
}
