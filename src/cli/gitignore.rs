//! `.gitignore` patching for the plaintext secrets folder and the project
//! file.  The encrypted archive itself is meant to be committed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::cli::output;

/// Append `entry` to `<project_dir>/.gitignore` unless an equivalent line
/// is already there.
///
/// Creates the file if needed.  Write errors are logged and otherwise
/// ignored.
pub fn patch_gitignore(project_dir: &Path, entry: &str) {
    let gitignore_path = project_dir.join(".gitignore");
    let existing = fs::read_to_string(&gitignore_path).unwrap_or_default();

    if is_ignored(&existing, entry) {
        return;
    }

    let separator = if existing.ends_with('\n') || existing.is_empty() {
        ""
    } else {
        "\n"
    };

    match fs::write(&gitignore_path, format!("{existing}{separator}{entry}\n")) {
        Ok(()) => output::info(&format!("Added '{entry}' to .gitignore")),
        Err(e) => debug!(error = %e, "could not update .gitignore"),
    }
}

/// `secrets/`, `secrets` and `/secrets/` all ignore the same folder.
fn is_ignored(gitignore: &str, entry: &str) -> bool {
    let wanted = entry.trim_matches('/');
    gitignore
        .lines()
        .map(|line| line.trim().trim_matches('/'))
        .any(|line| line == wanted)
}
