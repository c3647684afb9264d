mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

/// Route tracing output to stderr. `HSMCTL_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "hsmctl=debug" } else { "hsmctl=warn" };
    let filter = EnvFilter::try_from_env("HSMCTL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Cli) -> core::errors::Result<()> {
    let config = cli::commands::api_helpers::load_config(
        args.config.as_deref(),
        args.api_url.as_deref(),
    )?;
    tracing::debug!(api = %config.api_root(), "configuration loaded");

    match &args.command {
        Commands::Login { username, password } => {
            cli::commands::auth::execute_login(&config, username, password.as_deref())
        }
        Commands::Logout => cli::commands::auth::execute_logout(&config),
        Commands::Whoami => cli::commands::auth::execute_whoami(&config),
        Commands::Hsm { action } => cli::commands::hsm::execute(&config, action),
        Commands::Keys { action } => cli::commands::keys::execute(&config, action),
    }
}

fn main() {
    let args = Cli::parse();

    init_logging(args.verbose);
    cli::context::init(args.home.as_deref());
    cli::output::set_quiet(args.quiet);

    if let Err(e) = run(&args) {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
