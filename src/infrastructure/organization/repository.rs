//! In-memory organization repository implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::organization::{Organization, OrganizationId, OrganizationRepository};
use crate::domain::versioning::{CachedAggregate, RecordFetcher, VersionProbe, VersionStamp};
use crate::domain::DomainError;

/// In-memory implementation of OrganizationRepository.
///
/// Every write stamps the row with the next value of a process-wide counter.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationRepository {
    organizations: Arc<RwLock<HashMap<OrganizationId, Organization>>>,
    counter: AtomicU64,
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> VersionStamp {
        VersionStamp::from_counter(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn not_found(id: &OrganizationId) -> DomainError {
        DomainError::not_found(format!("Organization '{}' not found", id))
    }
}

#[async_trait]
impl VersionProbe<OrganizationId> for InMemoryOrganizationRepository {
    async fn current_version(&self, id: &OrganizationId) -> Result<VersionStamp, DomainError> {
        let organizations = self.organizations.read().await;

        organizations
            .get(id)
            .map(|o| o.version().clone())
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl RecordFetcher<Organization, OrganizationId> for InMemoryOrganizationRepository {
    async fn fetch(&self, id: &OrganizationId) -> Result<Organization, DomainError> {
        let organizations = self.organizations.read().await;
        organizations.get(id).cloned().ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn find(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        let organizations = self.organizations.read().await;
        Ok(organizations.get(id).cloned())
    }

    async fn create(&self, organization: Organization) -> Result<Organization, DomainError> {
        let mut organizations = self.organizations.write().await;

        if organizations.contains_key(organization.identifier()) {
            return Err(DomainError::conflict(format!(
                "Organization '{}' already exists",
                organization.identifier()
            )));
        }

        let stored = organization.with_version(self.next_version());
        organizations.insert(*stored.identifier(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, organization: Organization) -> Result<Organization, DomainError> {
        let mut organizations = self.organizations.write().await;

        if !organizations.contains_key(organization.identifier()) {
            return Err(Self::not_found(organization.identifier()));
        }

        let stored = organization.with_version(self.next_version());
        organizations.insert(*stored.identifier(), stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_version() {
        let repo = InMemoryOrganizationRepository::new();
        let org = Organization::new(OrganizationId::generate(), "Acme").unwrap();

        let created = repo.create(org).await.unwrap();

        assert_eq!(created.version(), &VersionStamp::from_counter(1));
        assert_eq!(
            repo.current_version(created.identifier()).await.unwrap(),
            VersionStamp::from_counter(1)
        );
    }

    #[tokio::test]
    async fn test_update_changes_version() {
        let repo = InMemoryOrganizationRepository::new();
        let created = repo
            .create(Organization::new(OrganizationId::generate(), "Acme").unwrap())
            .await
            .unwrap();

        let mut renamed = created.clone();
        renamed.rename("Acme Corp").unwrap();
        let updated = repo.update(renamed).await.unwrap();

        assert_ne!(updated.version(), created.version());
        assert_eq!(repo.fetch(created.identifier()).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryOrganizationRepository::new();
        let org = Organization::new(OrganizationId::generate(), "Acme").unwrap();

        assert!(repo.update(org).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let repo = InMemoryOrganizationRepository::new();
        let org = Organization::new(OrganizationId::generate(), "Acme").unwrap();

        repo.create(org.clone()).await.unwrap();
        let err = repo.create(org).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_probe_and_fetch_missing() {
        let repo = InMemoryOrganizationRepository::new();
        let id = OrganizationId::generate();

        assert!(repo.current_version(&id).await.unwrap_err().is_not_found());
        assert!(repo.fetch(&id).await.unwrap_err().is_not_found());
    }
}
