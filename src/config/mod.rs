//! Configuration: `.secrets-vault.toml` settings and the persisted
//! per-directory project file.

pub mod project;
pub mod settings;

pub use project::ProjectConfig;
pub use settings::{CredentialBackend, Settings};
