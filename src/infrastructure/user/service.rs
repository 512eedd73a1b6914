//! User service for registration, verification and cached lookups

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::cache::Cache;
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::user::{User, UserId, UserProfile, UserRepository};
use crate::domain::versioning::{CacheCoordinator, CacheInvalidator, CachedAggregate, Fetched};
use crate::domain::DomainError;
use crate::infrastructure::cache::invalidate_after_write;

/// Request for registering a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub profile: UserProfile,
    pub organization_id: OrganizationId,
}

/// User service
///
/// Lookups by client id and email go through alias keys only; when no alias
/// entry is cached the caller is treated as unauthenticated.
#[derive(Debug)]
pub struct UserService<R: UserRepository + 'static> {
    repository: Arc<R>,
    coordinator: Arc<CacheCoordinator<User>>,
    invalidator: CacheInvalidator<User>,
    organizations: Arc<CacheCoordinator<Organization>>,
    warm_on_write: bool,
}

impl<R: UserRepository + 'static> UserService<R> {
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn Cache>,
        ttl: Duration,
        organizations: Arc<CacheCoordinator<Organization>>,
    ) -> Self {
        let coordinator =
            CacheCoordinator::new(cache.clone(), repository.clone(), repository.clone(), ttl);

        Self {
            repository,
            coordinator: Arc::new(coordinator),
            invalidator: CacheInvalidator::new(cache),
            organizations,
            warm_on_write: true,
        }
    }

    /// Re-populate the primary and alias keys right after each write (on by default)
    pub fn with_cache_warming(mut self, enabled: bool) -> Self {
        self.warm_on_write = enabled;
        self
    }

    pub async fn create(
        &self,
        request: CreateUserRequest,
        cancel: &CancellationToken,
    ) -> Result<User, DomainError> {
        info!(email = %request.profile.email_id, organization = %request.organization_id, "Creating user");

        let user = User::new(UserId::generate(), request.profile, request.organization_id)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        self.ensure_active_organization(&request.organization_id, cancel)
            .await?;

        let created = self.repository.create(user).await?;
        self.after_write(&created, cancel).await;

        Ok(created)
    }

    /// Mark the email verified, which activates the account
    pub async fn verify_email(
        &self,
        id: &UserId,
        cancel: &CancellationToken,
    ) -> Result<User, DomainError> {
        info!(id = %id, "Verifying user email");

        let mut user = self.load_for_write(id).await?;
        user.verify_email();

        let updated = self.repository.update(user).await?;
        self.after_write(&updated, cancel).await;

        Ok(updated)
    }

    /// Rewrite the row unchanged apart from its modification time, forcing a new version
    pub async fn touch(&self, id: &UserId, cancel: &CancellationToken) -> Result<User, DomainError> {
        info!(id = %id, "Touching user row version");

        let mut user = self.load_for_write(id).await?;
        user.touch();

        let updated = self.repository.update(user).await?;
        self.after_write(&updated, cancel).await;

        Ok(updated)
    }

    pub async fn get(
        &self,
        id: &UserId,
        cancel: &CancellationToken,
    ) -> Result<Fetched<User>, DomainError> {
        self.coordinator.get(id, cancel).await
    }

    /// Resolve the user owning a request signing client id
    pub async fn get_by_client_id(
        &self,
        client_id: &Uuid,
        cancel: &CancellationToken,
    ) -> Result<Fetched<User>, DomainError> {
        self.coordinator
            .get_by_alias(&User::client_alias(client_id), cancel)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Unauthorized access"))
    }

    /// Resolve the user for a login email address
    pub async fn get_by_email(
        &self,
        email_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Fetched<User>, DomainError> {
        self.coordinator
            .get_by_alias(&User::email_alias(email_id), cancel)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Unauthorized access"))
    }

    async fn ensure_active_organization(
        &self,
        id: &OrganizationId,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        match self.organizations.get(id, cancel).await {
            Ok(fetched) if fetched.aggregate.status().is_active() => Ok(()),
            Ok(_) => Err(DomainError::validation(format!(
                "Organization '{}' is not active",
                id
            ))),
            Err(e) if e.is_not_found() => Err(DomainError::validation(format!(
                "Organization '{}' does not exist",
                id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn load_for_write(&self, id: &UserId) -> Result<User, DomainError> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    // Alias lookups never fall back to persistence, so the aliases are refilled here
    async fn after_write(&self, user: &User, cancel: &CancellationToken) {
        invalidate_after_write(&self.invalidator, user, cancel).await;

        if !self.warm_on_write {
            return;
        }

        let id = user.identifier();
        match self.coordinator.refresh(id, cancel).await {
            Ok(_) => debug!(id = %id, "Warmed user cache"),
            // Users outside the served status are not cached
            Err(e) if e.is_not_found() => debug!(id = %id, "User not servable, cache left cold"),
            Err(e) => warn!(id = %id, error = %e, "Failed to warm user cache"),
        }
    }
}
