use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in secrets-vault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault state errors ---
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("{0} not found")]
    ArchiveMissing(PathBuf),

    #[error("Secrets are currently mounted at {0}")]
    AlreadyMounted(PathBuf),

    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("No files found in secrets folder")]
    EmptyVault,

    #[error("Vault has been destroyed")]
    Destroyed,

    #[error("Invalid secrets file format: {0}")]
    FormatError(String),

    #[error("Invalid project name: {0}")]
    InvalidProjectName(String),

    // --- Password errors ---
    #[error("No password available for this project")]
    NoPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    // --- Credential store errors ---
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Interrupted")]
    Interrupted,
}

impl VaultError {
    /// A follow-up suggestion for the user, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DecryptionFailed => {
                Some("Store the correct password with `secrets-vault pass`, then mount again.")
            }
            Self::AlreadyExists(_) => {
                Some("Use `secrets-vault mount` to decrypt existing secrets, or delete the file first.")
            }
            Self::ArchiveMissing(_) => Some("Create secrets first with `secrets-vault create`."),
            Self::AlreadyMounted(_) => Some("Unmount first with `secrets-vault unmount`."),
            Self::NoPassword => Some("Store the password first with `secrets-vault pass`."),
            Self::Interrupted => Some("The archive was left untouched; run the command again."),
            _ => None,
        }
    }
}

/// Convenience type alias for secrets-vault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failure_suggests_pass() {
        let hint = VaultError::DecryptionFailed.hint().unwrap();
        assert!(hint.contains("pass"));
    }

    #[test]
    fn io_errors_have_no_hint() {
        let err = VaultError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(err.hint().is_none());
        assert!(err.to_string().contains("boom"));
    }
}
