//! dbhub CLI - check connection configurations from the command line.

use clap::Parser;

use dbhub_cli::cli::{Cli, Command};
use dbhub_cli::commands;
use dbhub_cli::error::CliResult;
use dbhub_cli::output;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        for cause in e.causes() {
            output::dim(&format!("  caused by: {}", cause));
        }
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.log_level {
        Some(level) => dbhub::logging::init_with(dbhub::logging::LogSettings::with_level(level.as_str())),
        None => dbhub::logging::init(),
    }

    match cli.command {
        Command::Check(args) => commands::check::run(args).await,
        Command::Parse(args) => commands::parse::run(args).await,
        Command::Version => commands::version::run().await,
    }
}
