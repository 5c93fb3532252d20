//! Schemaproof CLI: the `schemaproof` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SCHEMAPROOF_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { sql, rows, json } => commands::classify::run(sql, rows, json),

        Commands::Score { inputs, json } => commands::score::run(inputs, json),

        Commands::Investigate { inputs, json } => commands::investigate::run(inputs, json),

        Commands::Verify {
            inputs,
            repo,
            strict,
            json,
        } => commands::verify::run(commands::verify::Args {
            inputs,
            repo,
            strict,
            json,
        }),
    }
}
