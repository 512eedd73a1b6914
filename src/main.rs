use clap::Parser;
use rowversion_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => cli::migrate::run(args).await,
        Command::Organization(command) => cli::organization::run(command).await,
        Command::User(command) => cli::user::run(command).await,
    }
}
