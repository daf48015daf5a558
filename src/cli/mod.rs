//! CLI module: Clap argument parser, prompts, project detection, and
//! command implementations.

pub mod commands;
pub mod gitignore;
pub mod output;

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::Parser;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::{CredentialBackend, ProjectConfig, Settings};
use crate::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::errors::{Result, VaultError};
use crate::vault::{validate_project_name, Interrupt, SecurePrompt, Vault, VaultContext};

/// Environment variable consulted for `--password` (CI/CD friendly).
pub const PASSWORD_ENV: &str = "SECRETS_VAULT_PASSWORD";

/// Project name used when nothing better can be detected.
const FALLBACK_PROJECT: &str = "secrets_project";

/// secrets-vault: keep a folder of secrets encrypted at rest.
#[derive(Parser)]
#[command(
    name = "secrets-vault",
    about = "Encrypt a folder of secrets into a single file you can commit",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a vault in the current directory
    Create {
        /// Project name (default: detected from the directory)
        #[arg(short, long)]
        project: Option<String>,

        /// Plaintext secrets folder (default: from .secrets-vault.toml, or "secrets")
        #[arg(short, long)]
        secrets_dir: Option<String>,

        /// Password (omit for interactive prompt)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Decrypt the vault into the secrets folder
    Mount {
        /// Password (default: stored password, then prompt)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Encrypt the secrets folder and remove it
    Unmount {
        /// Password (default: stored password)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Store the password for this project
    Pass {
        /// Password (omit for interactive prompt)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored password for this project
    Clear,

    /// Re-encrypt the vault under a new password
    ChangePassword,

    /// Permanently delete the vault, secrets folder, and stored password
    Destroy,

    /// Show the vault's state
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Interactive prompt
// ---------------------------------------------------------------------------

/// `SecurePrompt` backed by `dialoguer`.
///
/// When stdin is not a terminal no secret is ever read and every
/// confirmation is declined, so scripts fail fast instead of hanging.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

impl DialoguerPrompt {
    fn interactive() -> bool {
        std::io::stdin().is_terminal()
    }
}

impl SecurePrompt for DialoguerPrompt {
    fn read_secret(&self, prompt: &str) -> Result<Zeroizing<String>> {
        if !Self::interactive() {
            return Err(VaultError::NoPassword);
        }
        let pw = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
        Ok(Zeroizing::new(pw))
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        if !Self::interactive() {
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Project detection
// ---------------------------------------------------------------------------

/// Project name and secrets folder for the vault in `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub project_name: String,
    pub secrets_dir: String,
}

/// Work out which vault lives in `root`.
///
/// Explicit values win.  Otherwise the project file is consulted, then a
/// lone `.<name>.secrets` archive, then the directory name.  The secrets
/// folder falls back to the value in `.secrets-vault.toml`.
pub fn detect_project(
    root: &Path,
    settings: &Settings,
    project: Option<&str>,
    secrets_dir: Option<&str>,
) -> Result<ProjectIdentity> {
    let saved = ProjectConfig::load(root).unwrap_or_else(|e| {
        debug!(error = %e, "ignoring unreadable project file");
        None
    });

    let project_name = match project {
        Some(name) => name.to_string(),
        None => saved
            .as_ref()
            .and_then(|c| c.project_name.clone())
            .or_else(|| find_archive_project(root))
            .unwrap_or_else(|| directory_project_name(root)),
    };
    validate_project_name(&project_name)?;

    let secrets_dir = match secrets_dir {
        Some(dir) => dir.to_string(),
        None => saved
            .and_then(|c| c.secrets_dir)
            .unwrap_or_else(|| settings.secrets_dir.clone()),
    };

    Ok(ProjectIdentity {
        project_name,
        secrets_dir,
    })
}

/// The project name of the only `.<name>.secrets` file in `root`, if
/// there is exactly one.
fn find_archive_project(root: &Path) -> Option<String> {
    let mut found = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let project = name.strip_prefix('.')?.strip_suffix(".secrets")?;
            (!project.is_empty() && entry.path().is_file()).then(|| project.to_string())
        });

    let first = found.next()?;
    match found.next() {
        None => Some(first),
        Some(_) => None,
    }
}

/// The directory's own name, or a fixed fallback if it is not usable.
fn directory_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| validate_project_name(n).is_ok())
        .map_or_else(|| FALLBACK_PROJECT.to_string(), str::to_string)
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// The interrupt shared by the Ctrl-C handler and every vault opened here.
pub fn interrupt() -> &'static Interrupt {
    static INTERRUPT: OnceLock<Interrupt> = OnceLock::new();
    INTERRUPT.get_or_init(Interrupt::new)
}

/// Route Ctrl-C through `interrupt()`.
///
/// While a vault is writing plaintext or rewriting the archive the
/// request is left for it to roll back and report; otherwise the process
/// exits at once.
pub fn install_interrupt_handler() {
    let interrupt = interrupt().clone();
    let installed = ctrlc::set_handler(move || {
        if !interrupt.request() {
            output::error("Interrupted");
            std::process::exit(1);
        }
    });
    if let Err(e) = installed {
        debug!(error = %e, "could not install Ctrl-C handler");
    }
}

/// Build the credential store selected in settings.
pub fn credential_store(backend: CredentialBackend) -> Result<Box<dyn CredentialStore>> {
    match backend {
        CredentialBackend::Memory => Ok(Box::new(MemoryCredentialStore::new())),
        CredentialBackend::File => Ok(Box::new(FileCredentialStore::in_home()?)),
        #[cfg(feature = "keyring-store")]
        CredentialBackend::Auto | CredentialBackend::Keyring => {
            Ok(Box::new(crate::credentials::KeyringCredentialStore::new()))
        }
        #[cfg(not(feature = "keyring-store"))]
        CredentialBackend::Auto => Ok(Box::new(FileCredentialStore::in_home()?)),
        #[cfg(not(feature = "keyring-store"))]
        CredentialBackend::Keyring => Err(VaultError::ConfigError(
            "keyring support not compiled; rebuild with `cargo build --features keyring-store`"
                .into(),
        )),
    }
}

/// Open the vault for the current directory.
pub fn open_vault(project: Option<&str>, secrets_dir: Option<&str>) -> Result<Vault> {
    let root = std::env::current_dir()?;
    open_vault_in(&root, project, secrets_dir)
}

/// Open the vault rooted at `root` with the interactive prompt and the
/// configured credential store.
pub fn open_vault_in(root: &Path, project: Option<&str>, secrets_dir: Option<&str>) -> Result<Vault> {
    let settings = Settings::load(root)?;
    let identity = detect_project(root, &settings, project, secrets_dir)?;
    debug!(
        project = %identity.project_name,
        secrets_dir = %identity.secrets_dir,
        "detected project"
    );

    let ctx = VaultContext::new(
        root,
        &identity.project_name,
        &identity.secrets_dir,
        credential_store(settings.credential_store)?,
        Box::new(DialoguerPrompt),
    )?
    .with_iterations(settings.pbkdf2_iterations)?
    .with_interrupt(interrupt().clone());

    Ok(Vault::new(ctx))
}

/// Keep the plaintext folder and project file out of version control.
pub fn protect_from_git(vault: &Vault) {
    let ctx = vault.context();
    gitignore::patch_gitignore(ctx.root(), &format!("{}/", ctx.secrets_dir_name()));
    gitignore::patch_gitignore(ctx.root(), ProjectConfig::FILE_NAME);
}

/// Path relative to the current directory, for display.
pub fn display_path(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}
