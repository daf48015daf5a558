//! Content hashing of the plaintext secrets directory.
//!
//! The hash drives the dirty check in `unmount`: if nothing changed since
//! the last mount or unmount, the archive is left alone so version control
//! sees no churn.  The last known hash lives in a marker file inside the
//! directory, which every walk skips.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{Result, VaultError};

/// Name of the marker file holding the last known directory hash.
pub const HASH_MARKER: &str = "secrets_manager.hash";

/// Files are read (and scrubbed) in chunks of this size.
pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// A regular file found below the secrets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// `/`-separated path relative to the walked directory.
    pub relative: String,
    /// Full path on disk.
    pub path: PathBuf,
}

/// List every file below `dir`, sorted by relative path.
///
/// Files whose name appears in `exclude` are skipped at any depth.  A
/// symlink to a file is listed under the link's path and read through
/// it.  Dangling links and links to directories are rejected with
/// `FormatError`, since removing the folder afterwards would lose them.
/// A missing directory yields an empty list.
pub fn tracked_files(dir: &Path, exclude: &[&str]) -> Result<Vec<TrackedFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| VaultError::Io(e.into()))?;
        if let Some(name) = entry.file_name().to_str() {
            if exclude.contains(&name) {
                continue;
            }
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => {
                    debug!(link = %entry.path().display(), "following symlinked file");
                }
                Ok(_) => {
                    return Err(VaultError::FormatError(format!(
                        "{} links to a directory; replace it with the files themselves",
                        entry.path().display()
                    )));
                }
                Err(e) => {
                    return Err(VaultError::FormatError(format!(
                        "{} is a broken symlink: {e}",
                        entry.path().display()
                    )));
                }
            }
        } else if !file_type.is_file() {
            continue;
        }

        let relative = relative_posix_path(dir, entry.path())?;
        files.push(TrackedFile {
            relative,
            path: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// Hash the content of `dir`, skipping files named in `exclude`.
///
/// Returns an empty string when the directory does not exist.
pub fn hash_directory(dir: &Path, exclude: &[&str]) -> Result<String> {
    if !dir.is_dir() {
        return Ok(String::new());
    }

    let files = tracked_files(dir, exclude)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    for file in &files {
        // Path, a separator, and the length keep (path, content) pairs
        // from running into each other.
        hasher.update(file.relative.as_bytes());
        hasher.update([0u8]);
        let mut reader = File::open(&file.path)?;
        hasher.update(reader.metadata()?.len().to_le_bytes());

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    }

    let digest = hex::encode(hasher.finalize());
    debug!(files = files.len(), hash = &digest[..12], "hashed secrets directory");
    Ok(digest)
}

/// Hash the secrets directory, excluding the marker file.
pub fn hash_secrets_dir(dir: &Path) -> Result<String> {
    hash_directory(dir, &[HASH_MARKER])
}

/// Read the hash recorded by the last mount or unmount.
pub fn stored_hash(dir: &Path) -> Option<String> {
    let marker = dir.join(HASH_MARKER);
    match fs::read_to_string(&marker) {
        Ok(content) => {
            let trimmed = content.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(_) => None,
    }
}

/// Hash `dir` and record the result in its marker file.
pub fn store_baseline(dir: &Path) -> Result<String> {
    let digest = hash_secrets_dir(dir)?;
    fs::write(dir.join(HASH_MARKER), format!("{digest}\n"))?;
    Ok(digest)
}

/// Whether `dir` differs from its recorded baseline.
///
/// A missing marker or a failed hash counts as changed, so ambiguity
/// always leads to re-encryption rather than a silent skip.
pub fn has_changed(dir: &Path) -> bool {
    let Some(stored) = stored_hash(dir) else {
        debug!("no stored hash, treating secrets as changed");
        return true;
    };

    match hash_secrets_dir(dir) {
        Ok(current) => {
            let changed = current != stored;
            debug!(changed, "compared secrets directory with stored hash");
            changed
        }
        Err(e) => {
            warn!(error = %e, "could not hash secrets directory");
            true
        }
    }
}

/// Build the `/`-separated relative path of `path` below `root`.
fn relative_posix_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| VaultError::FormatError(format!("{} is outside the vault", path.display())))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            VaultError::FormatError(format!(
                "file name {} is not valid UTF-8",
                path.display()
            ))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
