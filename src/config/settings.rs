use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::errors::{Result, VaultError};

/// Which credential store the CLI should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// OS keyring when compiled in, encrypted file otherwise.
    Auto,
    /// OS keyring (requires the `keyring-store` feature).
    Keyring,
    /// Encrypted file in the home directory.
    File,
    /// Process memory only; nothing is remembered between runs.
    Memory,
}

/// Project-level configuration, loaded from `.secrets-vault.toml`.
///
/// Every field has a sensible default so the tool works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Plaintext secrets directory (relative to the project root).
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: String,

    /// PBKDF2-HMAC-SHA256 iteration count for new archives.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Where passwords are remembered.
    #[serde(default = "default_credential_store")]
    pub credential_store: CredentialBackend,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_secrets_dir() -> String {
    "secrets".to_string()
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_credential_store() -> CredentialBackend {
    CredentialBackend::Auto
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            secrets_dir: default_secrets_dir(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            credential_store: default_credential_store(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".secrets-vault.toml";

    /// Load settings from `<project_dir>/.secrets-vault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.pbkdf2_iterations < MIN_ITERATIONS {
            return Err(VaultError::ConfigError(format!(
                "pbkdf2_iterations must be at least {MIN_ITERATIONS} (got {})",
                settings.pbkdf2_iterations
            )));
        }

        Ok(settings)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
