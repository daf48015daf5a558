//! Results reported by vault operations.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::archive::ArchiveSummary;

/// Where a vault currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VaultState {
    /// Neither archive nor secrets directory exists.
    Uninitialized,
    /// Only the archive exists.
    Unmounted,
    /// The secrets directory exists; `archived` tells whether an archive
    /// exists alongside it.
    Mounted { archived: bool },
    /// `destroy` ran on this vault.
    Destroyed,
}

/// What `create` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// An empty secrets directory was created.
    Initialized { password_stored: bool },
    /// An existing secrets directory was encrypted into a new archive.
    EncryptedExisting { files: usize, password_stored: bool },
}

/// What `mount` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountReport {
    /// Relative paths now present in the secrets directory.
    pub files: Vec<String>,
    /// The directory was already there; nothing was decrypted.
    pub already_mounted: bool,
    /// A password is stored for future operations.
    pub password_stored: bool,
}

/// What `unmount` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmountOutcome {
    /// There was no secrets directory.
    NotMounted,
    /// Content matched the last baseline: the archive was left untouched
    /// and the directory removed.
    Unchanged,
    /// The archive was rewritten and the directory removed.
    Encrypted { files: usize },
    /// The directory held no files and the user agreed to delete it.
    EmptyDiscarded,
    /// The directory held no files and was kept.
    EmptyKept,
}

/// Something `destroy` removed (or tried to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyedItem {
    Archive(PathBuf),
    Backup(PathBuf),
    SecretsDir(PathBuf),
    ProjectConfig(PathBuf),
    Credential(String),
}

impl fmt::Display for DestroyedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(p) => write!(f, "Encrypted file ({})", p.display()),
            Self::Backup(p) => write!(f, "Backup file ({})", p.display()),
            Self::SecretsDir(p) => write!(f, "Secrets folder ({}/)", p.display()),
            Self::ProjectConfig(p) => write!(f, "Config file ({})", p.display()),
            Self::Credential(name) => write!(f, "Stored password ({name})"),
        }
    }
}

/// Everything `destroy` touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroyReport {
    pub removed: Vec<DestroyedItem>,
    /// Items that could not be removed, with the reason.
    pub failed: Vec<(DestroyedItem, String)>,
}

impl DestroyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What `destroy` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// Not confirmed; nothing was deleted.
    Cancelled,
    Destroyed(DestroyReport),
}

/// The archive as seen by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ArchiveInfo {
    Missing,
    Parsed(ArchiveSummary),
    /// The archive exists but could not be read or parsed.
    Unreadable { error: String },
}

/// Read-only snapshot of a vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultStatus {
    pub project: String,
    pub secrets_dir: String,
    pub state: VaultState,
    pub archive_exists: bool,
    pub mounted: bool,
    /// Files currently in the secrets directory (when mounted).
    pub current_file_count: Option<usize>,
    pub password_stored: bool,
    pub archive: ArchiveInfo,
}
