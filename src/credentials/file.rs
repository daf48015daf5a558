//! Encrypted-file credential store.
//!
//! Fallback for systems without a usable OS keyring.  Each entry lives in
//! `<dir>/.<service>` with this layout:
//!
//! ```text
//! [salt: 32 bytes][nonce: 12 bytes][AES-256-GCM(password) + tag]
//! ```
//!
//! The key is derived from the local user name and the salt, so the file
//! is obfuscated against casual reads and protected by owner-only
//! permissions, not by a secret the user has to remember.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::CredentialStore;
use crate::crypto::kdf::{derive_key, SALT_LEN};
use crate::crypto::{decrypt, encrypt, generate_salt, OsRandom};
use crate::errors::{Result, VaultError};

/// Stores passwords as small encrypted files.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
    user: String,
}

impl FileCredentialStore {
    /// Store files in `dir`, keyed by `user`.
    pub fn new(dir: &Path, user: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            user: user.to_string(),
        }
    }

    /// Store files in the current user's home directory.
    pub fn in_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            VaultError::CredentialStore("cannot locate the home directory".into())
        })?;
        Ok(Self::new(&home, &current_user()))
    }

    /// Path of the file backing `service`.
    pub fn entry_path(&self, service: &str) -> PathBuf {
        self.dir.join(format!(".{service}"))
    }
}

impl CredentialStore for FileCredentialStore {
    fn has(&self, service: &str) -> bool {
        self.entry_path(service).is_file()
    }

    fn get(&self, service: &str) -> Result<Option<Zeroizing<String>>> {
        let path = self.entry_path(service);
        if !path.is_file() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        if data.len() <= SALT_LEN {
            debug!(path = %path.display(), "credential file too short, ignoring");
            return Ok(None);
        }

        let (salt, sealed) = data.split_at(SALT_LEN);
        let key = derive_key(self.user.as_bytes(), salt)?;
        let plaintext = decrypt(key.as_bytes(), sealed).map_err(|_| {
            VaultError::CredentialStore(format!("{} is corrupted", path.display()))
        })?;

        String::from_utf8(plaintext).map(|pw| Some(Zeroizing::new(pw))).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::CredentialStore("stored password is not valid UTF-8".into())
        })
    }

    fn set(&self, service: &str, password: &str) -> Result<()> {
        let path = self.entry_path(service);
        let salt = generate_salt(&OsRandom);
        let key = derive_key(self.user.as_bytes(), &salt)?;
        let sealed = encrypt(key.as_bytes(), password.as_bytes())?;

        let mut data = Vec::with_capacity(SALT_LEN + sealed.len());
        data.extend_from_slice(&salt);
        data.extend_from_slice(&sealed);

        fs::write(&path, &data).map_err(|e| {
            VaultError::CredentialStore(format!("failed to write {}: {e}", path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                VaultError::CredentialStore(format!("failed to restrict {}: {e}", path.display()))
            })?;
        }

        Ok(())
    }

    fn delete(&self, service: &str) -> Result<()> {
        let path = self.entry_path(service);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                VaultError::CredentialStore(format!("failed to remove {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }
}

/// Name of the logged-in user, used as key material for stored files.
fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "secrets-vault".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_password_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path(), "alice");

        assert!(!store.has("svc"));
        assert!(store.get("svc").unwrap().is_none());

        store.set("svc", "p@ss wörd").unwrap();
        assert!(store.has("svc"));
        assert_eq!(store.get("svc").unwrap().unwrap().as_str(), "p@ss wörd");

        let raw = fs::read(store.entry_path("svc")).unwrap();
        assert!(!raw.windows(4).any(|w| w == b"p@ss"));
    }

    #[test]
    fn other_user_cannot_read_entry() {
        let dir = TempDir::new().unwrap();
        FileCredentialStore::new(dir.path(), "alice")
            .set("svc", "secret")
            .unwrap();

        let result = FileCredentialStore::new(dir.path(), "mallory").get("svc");
        assert!(matches!(result, Err(VaultError::CredentialStore(_))));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path(), "alice");
        store.set("svc", "secret").unwrap();

        store.delete("svc").unwrap();
        assert!(!store.has("svc"));
        store.delete("svc").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn entry_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path(), "alice");
        store.set("svc", "secret").unwrap();

        let mode = fs::metadata(store.entry_path("svc")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
