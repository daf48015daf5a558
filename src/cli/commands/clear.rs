//! `secrets-vault clear`: forget the stored password.

use crate::cli::open_vault;
use crate::cli::output;
use crate::errors::Result;

/// Execute the `clear` command.
pub fn execute() -> Result<()> {
    let vault = open_vault(None, None)?;
    if vault.clear_password()? {
        output::success("Stored password removed.");
    } else {
        output::info("No stored password for this project.");
    }
    Ok(())
}
