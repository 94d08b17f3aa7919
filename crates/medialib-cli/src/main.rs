//! MediaLib CLI entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use medialib_core::config::{AppConfig, LoggingConfig};
use medialib_core::error::AppError;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    init_logging(&config.logging);

    if let Err(e) = cli.execute(&config).await {
        exit_with(&e);
    }
}

/// Report an error and exit: 2 when the request was rejected, 1 otherwise.
fn exit_with(e: &AppError) -> ! {
    output::print_error(&e.to_string());
    if let Some(details) = &e.details {
        eprintln!("{details}");
    }
    std::process::exit(if e.kind.is_client_error() { 2 } else { 1 })
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
