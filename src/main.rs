mod cli;
mod config;
mod core;
mod engines;
mod error;
mod models;
mod sources;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    if let Err(e) = cli::run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays the download report.
fn init_logging(verbose: bool) {
    let default = if verbose { "songman=debug" } else { "songman=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
