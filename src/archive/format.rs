//! Text archive format for encrypted vaults.
//!
//! A `.<project>.secrets` file is a pretty-printed JSON document:
//!
//! ```text
//! {
//!   "files": {
//!     "<relative/posix/path>": {
//!       "content": "<base64 of nonce || ciphertext || tag>",
//!       "permissions": "600"
//!     }
//!   },
//!   "metadata": {
//!     "created": "<RFC 3339 UTC timestamp>",
//!     "iterations": 100000,
//!     "project": "<project name>",
//!     "salt": "<base64 of the 32-byte PBKDF2 salt>",
//!     "version": "<tool version>"
//!   }
//! }
//! ```
//!
//! Keys are sorted and indented by two spaces with a trailing newline, so
//! the file diffs cleanly under version control.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Version string written into every archive.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level keys every archive must carry.
const REQUIRED_KEYS: [&str; 2] = ["metadata", "files"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

// Fields are declared in lexicographic order so the serialized document is
// sorted even when serde_json preserves insertion order.

/// Archive-wide metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// When this archive version was written.
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,

    /// PBKDF2 iteration count.  Absent in older archives (defaults apply).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,

    /// Project name the archive belongs to.
    pub project: String,

    /// The salt used for key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// Version of the tool that wrote the archive.
    pub version: String,
}

/// One encrypted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Nonce-prefixed ciphertext (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub content: Vec<u8>,

    /// Three-digit octal permission string, e.g. `"600"`.
    pub permissions: String,
}

/// The whole archive document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivePackage {
    /// Relative POSIX path -> encrypted file.
    pub files: BTreeMap<String, ArchiveEntry>,

    pub metadata: ArchiveMetadata,
}

/// Metadata shown by `status` without decrypting anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveSummary {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub file_count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl ArchivePackage {
    /// Assemble a package from already-encrypted entries.
    pub fn new(
        project: &str,
        created_at: DateTime<Utc>,
        salt: &[u8],
        iterations: u32,
        files: BTreeMap<String, ArchiveEntry>,
    ) -> Self {
        Self {
            files,
            metadata: ArchiveMetadata {
                created_at,
                iterations: Some(iterations),
                project: project.to_string(),
                salt: salt.to_vec(),
                version: FORMAT_VERSION.to_string(),
            },
        }
    }

    /// Serialize to the on-disk text form.
    pub fn to_document(&self) -> Result<String> {
        // Going through `Value` sorts every object's keys.
        let value = serde_json::to_value(self)
            .map_err(|e| VaultError::SerializationError(format!("archive: {e}")))?;
        let mut document = serde_json::to_string_pretty(&value)
            .map_err(|e| VaultError::SerializationError(format!("archive: {e}")))?;
        document.push('\n');
        Ok(document)
    }

    /// Parse the on-disk text form.
    ///
    /// Rejects documents missing `metadata` or `files`, malformed base64,
    /// and entry paths that would escape the secrets directory.
    pub fn from_document(document: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| VaultError::FormatError(format!("not valid JSON: {e}")))?;

        let object = value
            .as_object()
            .ok_or_else(|| VaultError::FormatError("top level is not an object".into()))?;
        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(VaultError::FormatError(format!("missing '{key}'")));
            }
        }

        let package: ArchivePackage = serde_json::from_value(value)
            .map_err(|e| VaultError::FormatError(e.to_string()))?;

        for relative in package.files.keys() {
            validate_entry_path(relative)?;
        }

        Ok(package)
    }

    /// Read and parse an archive file.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(VaultError::ArchiveMissing(path.to_path_buf()));
        }
        let document = fs::read_to_string(path)?;
        Self::from_document(&document)
    }

    /// Serialize and write the archive in place.
    ///
    /// Callers rewriting an existing archive wrap this in a
    /// `BackupGuard`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let document = self.to_document()?;
        fs::write(path, document)?;
        Ok(())
    }

    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            version: self.metadata.version.clone(),
            created_at: self.metadata.created_at,
            file_count: self.files.len(),
        }
    }
}

/// Check that an archive key is a plain relative POSIX path.
pub fn validate_entry_path(relative: &str) -> Result<()> {
    let bad = |why: &str| VaultError::FormatError(format!("entry '{relative}' {why}"));

    if relative.is_empty() {
        return Err(bad("has an empty path"));
    }
    if relative.starts_with('/') {
        return Err(bad("is absolute"));
    }
    for component in relative.split('/') {
        match component {
            "" => return Err(bad("contains an empty path component")),
            "." | ".." => return Err(bad("contains a relative path component")),
            c if c.contains('\\') || c.contains('\0') => {
                return Err(bad("contains an illegal character"))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Resolve an archive key below `root`.
pub fn entry_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(root.to_path_buf(), |path, component| path.join(component))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
