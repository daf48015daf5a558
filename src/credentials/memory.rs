//! In-memory credential store.

use std::cell::RefCell;
use std::collections::HashMap;

use zeroize::Zeroizing;

use super::CredentialStore;
use crate::errors::Result;

/// Keeps passwords for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RefCell<HashMap<String, Zeroizing<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with one entry.
    pub fn with_entry(service: &str, password: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(service.to_string(), Zeroizing::new(password.to_string()));
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn has(&self, service: &str) -> bool {
        self.entries.borrow().contains_key(service)
    }

    fn get(&self, service: &str) -> Result<Option<Zeroizing<String>>> {
        Ok(self.entries.borrow().get(service).cloned())
    }

    fn set(&self, service: &str, password: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(service.to_string(), Zeroizing::new(password.to_string()));
        Ok(())
    }

    fn delete(&self, service: &str) -> Result<()> {
        self.entries.borrow_mut().remove(service);
        Ok(())
    }
}
