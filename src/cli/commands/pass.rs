//! `secrets-vault pass`: store the password for this project.

use crate::cli::open_vault;
use crate::cli::output;
use crate::errors::Result;

/// Execute the `pass` command.
pub fn execute(password: Option<&str>) -> Result<()> {
    let vault = open_vault(None, None)?;
    vault.store_password(password)?;
    output::success(&format!(
        "Password stored for project '{}'",
        vault.context().project_name()
    ));
    Ok(())
}
