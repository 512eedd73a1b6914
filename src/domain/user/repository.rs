//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::versioning::{RecordFetcher, VersionProbe};
use crate::domain::DomainError;

/// Repository trait for user storage.
///
/// `fetch` only returns users in the status the repository serves; a user that
/// is filtered out is `NotFound`. `find` never filters.
#[async_trait]
pub trait UserRepository: VersionProbe<UserId> + RecordFetcher<User, UserId> + Debug {
    /// Get a user by their ID, in any status
    async fn find(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Create a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: User) -> Result<User, DomainError>;
}
