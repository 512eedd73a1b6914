//! Organization commands

use clap::Subcommand;

use super::{print_json, Session};
use crate::domain::OrganizationId;
use crate::infrastructure::organization::CreateOrganizationRequest;

#[derive(Subcommand)]
pub enum OrganizationCommand {
    /// Create an organization
    Create {
        #[arg(long)]
        name: String,
    },

    /// Read an organization through the cache (an in_memory cache does not outlive the command)
    Get { id: OrganizationId },

    /// Rename an organization
    Rename {
        id: OrganizationId,
        #[arg(long)]
        name: String,
    },

    /// Deactivate an organization
    Deactivate { id: OrganizationId },

    /// Check whether an organization exists
    Exists { id: OrganizationId },
}

pub async fn run(command: OrganizationCommand) -> anyhow::Result<()> {
    let session = Session::start();
    let services = crate::create_services_with_config(&session.config).await?;
    let organizations = &services.organizations;
    let cancel = &session.cancel;

    match command {
        OrganizationCommand::Create { name } => {
            let created = organizations
                .create(CreateOrganizationRequest { name }, cancel)
                .await?;
            print_json(&created)?;
        }
        OrganizationCommand::Get { id } => {
            print_json(&organizations.get(&id, cancel).await?)?;
        }
        OrganizationCommand::Rename { id, name } => {
            print_json(&organizations.rename(&id, &name, cancel).await?)?;
        }
        OrganizationCommand::Deactivate { id } => {
            print_json(&organizations.deactivate(&id, cancel).await?)?;
        }
        OrganizationCommand::Exists { id } => {
            println!("{}", organizations.exists(&id, cancel).await?);
        }
    }

    session.finish();
    Ok(())
}
