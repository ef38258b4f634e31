use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Cli;

fn main() -> eyre::Result<()> {
    // Structured JSON logging on stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    commands::run(Cli::parse())
}
