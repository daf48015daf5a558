//! OS keyring credential store.
//!
//! Stores vault passwords in the operating system's credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The credential entry name is the keyring *service*; the account is the
//! local user name.

use zeroize::Zeroizing;

use super::CredentialStore;
use crate::errors::{Result, VaultError};

/// Account name used for every keyring entry.
const ACCOUNT: &str = "secrets-vault";

/// Credential store backed by the `keyring` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(service: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(service, ACCOUNT)
            .map_err(|e| VaultError::CredentialStore(format!("failed to create keyring entry: {e}")))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn has(&self, service: &str) -> bool {
        matches!(self.get(service), Ok(Some(_)))
    }

    fn get(&self, service: &str) -> Result<Option<Zeroizing<String>>> {
        match Self::entry(service)?.get_password() {
            Ok(password) => Ok(Some(Zeroizing::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(VaultError::CredentialStore(format!(
                "failed to read from keyring: {e}"
            ))),
        }
    }

    fn set(&self, service: &str, password: &str) -> Result<()> {
        Self::entry(service)?.set_password(password).map_err(|e| {
            VaultError::CredentialStore(format!("failed to store password in keyring: {e}"))
        })
    }

    fn delete(&self, service: &str) -> Result<()> {
        match Self::entry(service)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::CredentialStore(format!(
                "failed to delete from keyring: {e}"
            ))),
        }
    }
}
