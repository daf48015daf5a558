//! The per-directory project file, `.secrets_keychain_entry`.
//!
//! Plain text, one value per line:
//!
//! ```text
//! <credential entry name>
//! <project name>
//! <secrets directory>
//! ```
//!
//! The entry name is written once and kept across project renames.  Older
//! files may hold only the first line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Persisted identity of the vault in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub entry_name: String,
    pub project_name: Option<String>,
    pub secrets_dir: Option<String>,
}

impl ProjectConfig {
    /// Name of the project file in the vault root.
    pub const FILE_NAME: &'static str = ".secrets_keychain_entry";

    pub fn path(root: &Path) -> PathBuf {
        root.join(Self::FILE_NAME)
    }

    /// Load the project file, or `None` if it is absent or empty.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = Self::path(root);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Parse the file body.  The last two of three or more lines are the
    /// project name and secrets directory.
    pub fn parse(content: &str) -> Option<Self> {
        let lines: Vec<&str> = content.trim().lines().map(str::trim).collect();
        let entry_name = lines.first().filter(|l| !l.is_empty())?.to_string();

        let (project_name, secrets_dir) = if lines.len() >= 3 {
            (
                Some(lines[lines.len() - 2].to_string()),
                Some(lines[lines.len() - 1].to_string()),
            )
        } else {
            (None, None)
        };

        Some(Self {
            entry_name,
            project_name,
            secrets_dir,
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let mut content = self.entry_name.clone();
        if let (Some(project), Some(dir)) = (&self.project_name, &self.secrets_dir) {
            content.push_str(&format!("\n{project}\n{dir}"));
        }
        fs::write(Self::path(root), content)?;
        Ok(())
    }

    /// Delete the project file.  Returns whether one existed.
    pub fn remove(root: &Path) -> Result<bool> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}
