//! Everything a vault operation needs, passed explicitly.
//!
//! `VaultContext` carries the project identity, resolved paths, KDF cost,
//! and the injected collaborators: credential store, prompt, clock,
//! random source and interrupt flag.  Nothing in the vault core reads the working directory
//! or other process-wide state.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::config::ProjectConfig;
use crate::credentials::{entry_name_for, CredentialStore};
use crate::crypto::kdf::{DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::crypto::{OsRandom, RandomSource};
use crate::errors::{Result, VaultError};

use super::interrupt::Interrupt;

/// Longest accepted project name.
const MAX_PROJECT_NAME_LEN: usize = 128;

/// Reads secrets and confirmations from the user.
pub trait SecurePrompt {
    /// Read a secret without echoing it.
    fn read_secret(&self, prompt: &str) -> Result<Zeroizing<String>>;

    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// A prompt for non-interactive use: never supplies a secret, declines
/// every confirmation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl SecurePrompt for NoPrompt {
    fn read_secret(&self, _prompt: &str) -> Result<Zeroizing<String>> {
        Err(VaultError::NoPassword)
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Source of archive timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Project identity, paths, and collaborators for one vault.
pub struct VaultContext {
    project_name: String,
    root: PathBuf,
    secrets_dir_name: String,
    secrets_dir: PathBuf,
    secrets_file: PathBuf,
    entry_name: String,
    iterations: u32,
    credentials: Box<dyn CredentialStore>,
    prompt: Box<dyn SecurePrompt>,
    clock: Box<dyn Clock>,
    random: Box<dyn RandomSource>,
    interrupt: Interrupt,
}

impl VaultContext {
    /// Build a context for the vault `project_name` rooted at `root`.
    ///
    /// The credential entry name comes from the project file when one
    /// exists, otherwise it is derived from the absolute `root`.
    pub fn new(
        root: &Path,
        project_name: &str,
        secrets_dir_name: &str,
        credentials: Box<dyn CredentialStore>,
        prompt: Box<dyn SecurePrompt>,
    ) -> Result<Self> {
        validate_project_name(project_name)?;
        validate_secrets_dir_name(secrets_dir_name)?;

        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        let entry_name = match ProjectConfig::load(&root) {
            Ok(Some(config)) => config.entry_name,
            _ => entry_name_for(&root),
        };

        Ok(Self {
            project_name: project_name.to_string(),
            secrets_dir: root.join(secrets_dir_name),
            secrets_file: root.join(format!(".{project_name}.secrets")),
            secrets_dir_name: secrets_dir_name.to_string(),
            root,
            entry_name,
            iterations: DEFAULT_ITERATIONS,
            credentials,
            prompt,
            clock: Box::new(SystemClock),
            random: Box::new(OsRandom),
            interrupt: Interrupt::new(),
        })
    }

    /// Use a different PBKDF2 iteration count for new archives.
    pub fn with_iterations(mut self, iterations: u32) -> Result<Self> {
        if iterations < MIN_ITERATIONS {
            return Err(VaultError::KeyDerivationFailed(format!(
                "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {iterations})"
            )));
        }
        self.iterations = iterations;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Share `interrupt` with a signal handler.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// The directory holding both the archive and the secrets directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The secrets directory as configured (relative to `root`).
    pub fn secrets_dir_name(&self) -> &str {
        &self.secrets_dir_name
    }

    pub fn secrets_dir(&self) -> &Path {
        &self.secrets_dir
    }

    /// `<root>/.<project>.secrets`
    pub fn secrets_file(&self) -> &Path {
        &self.secrets_file
    }

    /// Credential store entry for this directory.
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    pub fn prompt(&self) -> &dyn SecurePrompt {
        self.prompt.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}

/// Validate that a project name is safe to embed in a file name.
///
/// Allowed: any characters except path separators and NUL.  Must be
/// non-empty, at most 128 characters, and must not start with `.`.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultError::InvalidProjectName(
            "project name cannot be empty".into(),
        ));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(VaultError::InvalidProjectName(format!(
            "project name cannot exceed {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(VaultError::InvalidProjectName(format!(
            "'{name}' contains a path separator"
        )));
    }
    if name.starts_with('.') {
        return Err(VaultError::InvalidProjectName(format!(
            "'{name}' cannot start with '.'"
        )));
    }
    Ok(())
}

/// The secrets directory must stay inside the vault root.
fn validate_secrets_dir_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if name.is_empty() || escapes {
        return Err(VaultError::ConfigError(format!(
            "secrets directory '{name}' must be a relative path inside the project"
        )));
    }
    Ok(())
}
