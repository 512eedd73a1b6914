//! Migrate command - applies the embedded schema migrations

use clap::Args;
use tracing::info;

use super::Session;
use crate::infrastructure::storage::{connect_pool, Migrator, PostgresMigrator};

#[derive(Args)]
pub struct MigrateArgs {
    /// Revert the most recent migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let session = Session::start();
    let pool = connect_pool(&session.config.database.postgres()).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.revert {
        migrator.revert().await?;
    } else {
        let applied = migrator.run().await?;
        info!(applied, "Migrations applied");
    }

    match migrator.version().await? {
        Some(version) => println!("schema version {}", version),
        None => println!("no migrations applied"),
    }
    session.finish();

    Ok(())
}
