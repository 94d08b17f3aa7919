//! Database migration management commands.

use clap::{Args, Subcommand};

use crate::output;
use medialib_core::error::AppError;
use medialib_database::DatabasePool;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, pool: &DatabasePool) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            let known = medialib_database::migration::run_migrations(pool.pool()).await?;
            output::print_success(&format!("Schema up to date ({known} migrations)."));
        }
    }

    Ok(())
}
