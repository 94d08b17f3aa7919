//! CLI command definitions and dispatch.

pub mod folder;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use medialib_core::config::AppConfig;
use medialib_core::error::AppError;
use medialib_database::DatabasePool;

/// MediaLib — media library folder management
#[derive(Debug, Parser)]
#[command(name = "medialib", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Folder management
    Folder(folder::FolderArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let pool = DatabasePool::connect(&config.database).await?;

        let result = match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &pool).await,
            Commands::Folder(args) => folder::execute(args, &pool, self.format).await,
        };

        pool.close().await;
        result
    }
}
