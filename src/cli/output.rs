//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{ArchiveInfo, VaultState, VaultStatus};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a list of file paths, one per line, indented.
pub fn file_list(files: &[String]) {
    for file in files {
        println!("  {file}");
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn state_label(state: VaultState) -> &'static str {
    match state {
        VaultState::Uninitialized => "not created",
        VaultState::Unmounted => "locked",
        VaultState::Mounted { archived: true } => "mounted",
        VaultState::Mounted { archived: false } => "mounted (never encrypted)",
        VaultState::Destroyed => "destroyed",
    }
}

/// Print a vault status as a two-column table.
pub fn print_status_table(status: &VaultStatus) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Property", "Value"]);

    table.add_row(vec!["Project".to_string(), status.project.clone()]);
    table.add_row(vec!["State".to_string(), state_label(status.state).to_string()]);
    table.add_row(vec!["Secrets folder".to_string(), format!("{}/", status.secrets_dir)]);
    table.add_row(vec!["Encrypted file".to_string(), yes_no(status.archive_exists)]);
    table.add_row(vec!["Mounted".to_string(), yes_no(status.mounted)]);
    if let Some(count) = status.current_file_count {
        table.add_row(vec!["Files in folder".to_string(), count.to_string()]);
    }
    table.add_row(vec!["Password stored".to_string(), yes_no(status.password_stored)]);

    match &status.archive {
        ArchiveInfo::Missing => {}
        ArchiveInfo::Parsed(summary) => {
            table.add_row(vec!["Format version".to_string(), summary.version.clone()]);
            table.add_row(vec![
                "Encrypted at".to_string(),
                summary.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ]);
            table.add_row(vec!["Encrypted files".to_string(), summary.file_count.to_string()]);
        }
        ArchiveInfo::Unreadable { error } => {
            table.add_row(vec!["Archive".to_string(), format!("unreadable: {error}")]);
        }
    }

    println!("{table}");
}
