//! `secrets-vault change-password`: re-encrypt under a new password.

use crate::cli::open_vault;
use crate::cli::output;
use crate::errors::Result;

/// Execute the `change-password` command.
pub fn execute() -> Result<()> {
    let vault = open_vault(None, None)?;
    if !vault.has_stored_password() {
        output::info("Enter the current password, then choose a new one.");
    }

    let files = vault.change_password(None, None)?;

    output::success(&format!(
        "Password changed for '{}' ({files} file(s) re-encrypted)",
        vault.context().project_name()
    ));
    Ok(())
}
