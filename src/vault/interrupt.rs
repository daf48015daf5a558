//! Cooperative interrupt handling.
//!
//! A signal handler calls `Interrupt::request`.  Vault operations that
//! write plaintext or rewrite the archive run inside an `InterruptScope`
//! and poll it between files, so they can roll back before returning.
//! Outside a scope there is nothing to undo and the handler may exit
//! straight away.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::{Result, VaultError};

/// Shared interrupt flag.  Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    requested: Arc<AtomicBool>,
    busy: Arc<AtomicUsize>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt.
    ///
    /// Returns `true` when a scope is active and will clean up on its
    /// own; `false` means nothing is in flight.
    pub fn request(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.busy.load(Ordering::SeqCst) > 0
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Enter a section that must be rolled back if interrupted.  Scopes
    /// nest.
    ///
    /// Fails with `Interrupted` if a request is already pending.
    pub fn enter(&self) -> Result<InterruptScope<'_>> {
        self.busy.fetch_add(1, Ordering::SeqCst);
        let scope = InterruptScope { interrupt: self };
        scope.check()?;
        Ok(scope)
    }
}

/// An active section; the handler defers to it until it is dropped.
#[derive(Debug)]
pub struct InterruptScope<'a> {
    interrupt: &'a Interrupt,
}

impl InterruptScope<'_> {
    pub fn check(&self) -> Result<()> {
        if self.interrupt.is_requested() {
            return Err(VaultError::Interrupted);
        }
        Ok(())
    }
}

impl Drop for InterruptScope<'_> {
    fn drop(&mut self) {
        self.interrupt.busy.fetch_sub(1, Ordering::SeqCst);
    }
}
