//! CLI module for the row-version cache
//!
//! Subcommands drive the services against the configured database and cache:
//! - `migrate`: apply or revert the schema
//! - `organization`: create, read and modify organizations
//! - `user`: register, verify and look up users

pub mod migrate;
pub mod organization;
pub mod user;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::{init_metrics, PrometheusMetrics};

/// Row-version cache - version-checked cache-aside reads for organizations and users
#[derive(Parser)]
#[command(name = "rowversion-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply (or revert) database migrations
    Migrate(migrate::MigrateArgs),

    /// Organization commands
    #[command(subcommand)]
    Organization(organization::OrganizationCommand),

    /// User commands
    #[command(subcommand)]
    User(user::UserCommand),
}

/// Shared setup for every command
pub(crate) struct Session {
    pub config: AppConfig,
    pub cancel: CancellationToken,
    metrics: Option<PrometheusMetrics>,
}

impl Session {
    pub fn start() -> Self {
        dotenvy::dotenv().ok();

        let config = AppConfig::load().unwrap_or_default();
        init_logging(&config.logging);
        let metrics = init_metrics(&config.metrics);

        let cancel = CancellationToken::new();
        tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

        Self {
            config,
            cancel,
            metrics,
        }
    }

    /// Write the metrics exposition to stderr when the recorder is installed
    pub fn finish(self) {
        if let Some(metrics) = self.metrics {
            eprintln!("{}", metrics.render());
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, cancelling");
        cancel.cancel();
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn about(path: &[&str]) -> String {
        let mut command = Cli::command();
        for name in path {
            command = command.find_subcommand(name).unwrap().clone();
        }
        command.get_about().unwrap().to_string()
    }

    #[test]
    fn test_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cached_reads_mention_cache_lifetime() {
        assert!(about(&["organization", "get"]).contains("does not outlive the command"));
        assert!(about(&["user", "get"]).contains("does not outlive the command"));
        assert!(about(&["user", "by-email"]).contains("shared across commands"));
    }
}
