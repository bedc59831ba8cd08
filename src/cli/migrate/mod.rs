//! Migrate command - applies or reverts the embedded schema migrations

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::migrations::{Migrator, PostgresMigrator};

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration
    #[arg(long, conflicts_with = "status")]
    pub revert: bool,

    /// Print the current schema version without changing anything
    #[arg(long)]
    pub status: bool,
}

/// Run the migrate command
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;
    config.validate()?;

    let pool = crate::connect_database(&config).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.status {
        match migrator.version().await? {
            Some(version) => info!(version, "Current schema version"),
            None => info!("No migrations applied"),
        }
    } else if args.revert {
        match migrator.revert().await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("Nothing to revert"),
        }
    } else {
        let applied = migrator.run().await?;
        info!(applied, "Migrations applied");
    }

    Ok(())
}
