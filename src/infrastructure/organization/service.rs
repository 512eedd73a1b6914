//! Organization service for organization management

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::cache::Cache;
use crate::domain::organization::{Organization, OrganizationId, OrganizationRepository};
use crate::domain::versioning::{CacheCoordinator, CacheInvalidator, CachedAggregate, Fetched};
use crate::domain::DomainError;
use crate::infrastructure::cache::invalidate_after_write;

/// Request for creating a new organization
#[derive(Debug, Clone)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

/// Organization service: persisted writes followed by invalidation, cached reads
#[derive(Debug)]
pub struct OrganizationService<R: OrganizationRepository + 'static> {
    repository: Arc<R>,
    coordinator: Arc<CacheCoordinator<Organization>>,
    invalidator: CacheInvalidator<Organization>,
    warm_on_write: bool,
}

impl<R: OrganizationRepository + 'static> OrganizationService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        let coordinator =
            CacheCoordinator::new(cache.clone(), repository.clone(), repository.clone(), ttl);

        Self {
            repository,
            coordinator: Arc::new(coordinator),
            invalidator: CacheInvalidator::new(cache),
            warm_on_write: true,
        }
    }

    /// Re-populate the cache right after each write (on by default)
    pub fn with_cache_warming(mut self, enabled: bool) -> Self {
        self.warm_on_write = enabled;
        self
    }

    /// Coordinator shared with services that resolve organizations through the cache
    pub fn coordinator(&self) -> Arc<CacheCoordinator<Organization>> {
        self.coordinator.clone()
    }

    pub async fn create(
        &self,
        request: CreateOrganizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Organization, DomainError> {
        info!(name = %request.name, "Creating organization");

        let organization = Organization::new(OrganizationId::generate(), request.name)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let created = self.repository.create(organization).await?;
        self.after_write(&created, cancel).await;

        Ok(created)
    }

    pub async fn rename(
        &self,
        id: &OrganizationId,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Organization, DomainError> {
        info!(id = %id, name = %name, "Renaming organization");

        let mut organization = self.load_for_write(id).await?;
        organization
            .rename(name)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let updated = self.repository.update(organization).await?;
        self.after_write(&updated, cancel).await;

        Ok(updated)
    }

    pub async fn deactivate(
        &self,
        id: &OrganizationId,
        cancel: &CancellationToken,
    ) -> Result<Organization, DomainError> {
        info!(id = %id, "Deactivating organization");

        let mut organization = self.load_for_write(id).await?;
        organization.deactivate();

        let updated = self.repository.update(organization).await?;
        self.after_write(&updated, cancel).await;

        Ok(updated)
    }

    /// Read through the cache
    pub async fn get(
        &self,
        id: &OrganizationId,
        cancel: &CancellationToken,
    ) -> Result<Fetched<Organization>, DomainError> {
        self.coordinator.get(id, cancel).await
    }

    /// Whether an organization exists, answered through the cache
    pub async fn exists(
        &self,
        id: &OrganizationId,
        cancel: &CancellationToken,
    ) -> Result<bool, DomainError> {
        match self.coordinator.get(id, cancel).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // Writes always start from persistence, never from a cached copy
    async fn load_for_write(&self, id: &OrganizationId) -> Result<Organization, DomainError> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Organization '{}' not found", id)))
    }

    async fn after_write(&self, organization: &Organization, cancel: &CancellationToken) {
        invalidate_after_write(&self.invalidator, organization, cancel).await;

        if !self.warm_on_write {
            return;
        }

        let id = organization.identifier();
        match self.coordinator.refresh(id, cancel).await {
            Ok(_) => debug!(id = %id, "Warmed organization cache"),
            Err(e) => warn!(id = %id, error = %e, "Failed to warm organization cache"),
        }
    }
}
