//! User commands

use clap::Subcommand;
use uuid::Uuid;

use super::{print_json, Session};
use crate::domain::{OrganizationId, UserId, UserProfile};
use crate::infrastructure::user::CreateUserRequest;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user; new users stay inactive until their email is verified
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile_number: String,
        #[arg(long)]
        organization_id: OrganizationId,
    },

    /// Read a user through the cache (an in_memory cache does not outlive the command)
    Get { id: UserId },

    /// Resolve a user from a request signing client id; needs a cache shared across commands
    ByClient { client_id: Uuid },

    /// Resolve a user from a login email; needs a cache shared across commands
    ByEmail { email: String },

    /// Mark a user's email verified and activate the account
    VerifyEmail { id: UserId },

    /// Bump a user's modification date, which assigns a new row version
    Touch { id: UserId },
}

pub async fn run(command: UserCommand) -> anyhow::Result<()> {
    let session = Session::start();
    let services = crate::create_services_with_config(&session.config).await?;
    let users = &services.users;
    let cancel = &session.cancel;

    match command {
        UserCommand::Create {
            first_name,
            last_name,
            email,
            mobile_number,
            organization_id,
        } => {
            let request = CreateUserRequest {
                profile: UserProfile {
                    first_name,
                    last_name,
                    email_id: email,
                    mobile_number,
                },
                organization_id,
            };
            print_json(&users.create(request, cancel).await?)?;
        }
        UserCommand::Get { id } => print_json(&users.get(&id, cancel).await?)?,
        UserCommand::ByClient { client_id } => {
            print_json(&users.get_by_client_id(&client_id, cancel).await?)?
        }
        UserCommand::ByEmail { email } => print_json(&users.get_by_email(&email, cancel).await?)?,
        UserCommand::VerifyEmail { id } => print_json(&users.verify_email(&id, cancel).await?)?,
        UserCommand::Touch { id } => print_json(&users.touch(&id, cancel).await?)?,
    }

    session.finish();
    Ok(())
}
