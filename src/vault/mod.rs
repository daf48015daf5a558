//! Vault lifecycle.
//!
//! - `VaultContext` and the injected collaborators (`context`)
//! - Cooperative Ctrl-C handling (`interrupt`)
//! - Operation results and status snapshots (`outcome`)
//! - The `Vault` state machine itself (`machine`)

pub mod context;
pub mod interrupt;
pub mod machine;
pub mod outcome;

pub use context::{validate_project_name, Clock, NoPrompt, SecurePrompt, SystemClock, VaultContext};
pub use interrupt::{Interrupt, InterruptScope};
pub use machine::Vault;
pub use outcome::{
    ArchiveInfo, CreateOutcome, DestroyOutcome, DestroyReport, DestroyedItem, MountReport,
    UnmountOutcome, VaultState, VaultStatus,
};

/// The token a user must type to confirm `destroy`.
pub const DESTROY_CONFIRMATION: &str = "DELETE";

/// Whether `token` confirms a destroy.  Surrounding whitespace is ignored;
/// case is not.
pub fn confirms_destroy(token: &str) -> bool {
    token.trim() == DESTROY_CONFIRMATION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_requires_exact_token() {
        assert!(confirms_destroy("DELETE"));
        assert!(confirms_destroy("  DELETE\n"));
        assert!(!confirms_destroy("delete"));
        assert!(!confirms_destroy("yes"));
        assert!(!confirms_destroy(""));
    }
}
