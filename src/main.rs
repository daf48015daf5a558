use clap::Parser;
use secrets_vault::cli::commands;
use secrets_vault::cli::{install_interrupt_handler, output, Cli, Commands};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_interrupt_handler();

    let result = match cli.command {
        Commands::Create {
            ref project,
            ref secrets_dir,
            ref password,
        } => commands::create::execute(
            project.as_deref(),
            secrets_dir.as_deref(),
            password.as_deref(),
        ),
        Commands::Mount { ref password } => commands::mount::execute(password.as_deref()),
        Commands::Unmount { ref password } => commands::unmount::execute(password.as_deref()),
        Commands::Pass { ref password } => commands::pass::execute(password.as_deref()),
        Commands::Clear => commands::clear::execute(),
        Commands::ChangePassword => commands::change_password::execute(),
        Commands::Destroy => commands::destroy::execute(),
        Commands::Status { json } => commands::status::execute(json),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::tip(hint);
        }
        std::process::exit(1);
    }
}

/// Log to stderr: warnings by default, debug with `--verbose`, and
/// whatever `RUST_LOG` says when it is set.
fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
