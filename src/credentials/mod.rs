//! Password storage for vaults.
//!
//! The vault core only talks to the `CredentialStore` trait.  Adapters:
//! - `MemoryCredentialStore`: process-local, used by tests and scripts
//! - `FileCredentialStore`: encrypted file in the home directory
//! - `KeyringCredentialStore`: OS keyring (feature `keyring-store`)
//!
//! Passwords are filed under an entry name derived from the vault's
//! absolute directory, so renaming a project keeps its credential.

pub mod file;
pub mod memory;
#[cfg(feature = "keyring-store")]
pub mod os_keyring;

use std::path::Path;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::Result;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
#[cfg(feature = "keyring-store")]
pub use os_keyring::KeyringCredentialStore;

/// Prefix of every derived credential entry name.
const ENTRY_PREFIX: &str = "secrets_manager_dir_";

/// Hex characters of the directory hash kept in the entry name.
const ENTRY_HASH_LEN: usize = 12;

/// Secret storage keyed by service (entry) name.
pub trait CredentialStore {
    /// Whether a password is stored under `service`.
    fn has(&self, service: &str) -> bool;

    /// Fetch the password stored under `service`, if any.
    fn get(&self, service: &str) -> Result<Option<Zeroizing<String>>>;

    /// Store (or overwrite) the password for `service`.
    fn set(&self, service: &str, password: &str) -> Result<()>;

    /// Remove the password for `service`.  Removing nothing is not an error.
    fn delete(&self, service: &str) -> Result<()>;
}

/// Derive the credential entry name for a vault rooted at `root`.
///
/// `root` should be absolute; the same directory always maps to the same
/// name regardless of the project name.
pub fn entry_name_for(root: &Path) -> String {
    let digest = hex::encode(Sha256::digest(root.to_string_lossy().as_bytes()));
    format!("{ENTRY_PREFIX}{}", &digest[..ENTRY_HASH_LEN])
}
