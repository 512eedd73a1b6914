//! Organization repository trait

use async_trait::async_trait;

use super::entity::{Organization, OrganizationId};
use crate::domain::versioning::{RecordFetcher, VersionProbe};
use crate::domain::DomainError;

/// Repository for managing organizations.
///
/// Every successful `create` or `update` assigns a new version stamp; the returned
/// organization carries it.
#[async_trait]
pub trait OrganizationRepository:
    VersionProbe<OrganizationId> + RecordFetcher<Organization, OrganizationId> + std::fmt::Debug
{
    /// Get an organization by ID
    async fn find(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError>;

    /// Create a new organization
    async fn create(&self, organization: Organization) -> Result<Organization, DomainError>;

    /// Update an existing organization
    async fn update(&self, organization: Organization) -> Result<Organization, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::versioning::{CachedAggregate, VersionStamp};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::RwLock;

    /// Counting repository with probe and fetch failure injection
    #[derive(Debug, Default)]
    pub struct MockOrganizationRepository {
        organizations: RwLock<HashMap<OrganizationId, Organization>>,
        counter: AtomicU64,
        probe_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        probe_error: RwLock<Option<String>>,
        fetch_error: RwLock<Option<String>>,
    }

    impl MockOrganizationRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Persist and return the stored organization with a fresh version
        pub fn put(&self, organization: Organization) -> Organization {
            let version = VersionStamp::from_counter(self.counter.fetch_add(1, Ordering::SeqCst) + 1);
            let stored = organization.with_version(version);
            self.organizations
                .write()
                .unwrap()
                .insert(*stored.identifier(), stored.clone());
            stored
        }

        /// Write behind the cache's back, as a concurrent writer would
        pub fn rename_behind(&self, id: &OrganizationId, name: &str) -> Organization {
            let mut organization = self.organizations.read().unwrap()[id].clone();
            organization.rename(name).unwrap();
            self.put(organization)
        }

        pub fn remove(&self, id: &OrganizationId) {
            self.organizations.write().unwrap().remove(id);
        }

        pub fn fail_probe(&self, message: &str) {
            *self.probe_error.write().unwrap() = Some(message.to_string());
        }

        pub fn fail_fetch(&self, message: &str) {
            *self.fetch_error.write().unwrap() = Some(message.to_string());
        }

        pub fn heal(&self) {
            *self.probe_error.write().unwrap() = None;
            *self.fetch_error.write().unwrap() = None;
        }

        pub fn probe_calls(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }

        pub fn fetch_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn missing(id: &OrganizationId) -> DomainError {
            DomainError::not_found(format!("Organization '{}' not found", id))
        }
    }

    #[async_trait]
    impl VersionProbe<OrganizationId> for MockOrganizationRepository {
        async fn current_version(&self, id: &OrganizationId) -> Result<VersionStamp, DomainError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(message) = self.probe_error.read().unwrap().clone() {
                return Err(DomainError::upstream(message));
            }

            self.organizations
                .read()
                .unwrap()
                .get(id)
                .map(|o| o.version().clone())
                .ok_or_else(|| Self::missing(id))
        }
    }

    #[async_trait]
    impl RecordFetcher<Organization, OrganizationId> for MockOrganizationRepository {
        async fn fetch(&self, id: &OrganizationId) -> Result<Organization, DomainError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(message) = self.fetch_error.read().unwrap().clone() {
                return Err(DomainError::upstream(message));
            }

            self.organizations
                .read()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| Self::missing(id))
        }
    }

    #[async_trait]
    impl OrganizationRepository for MockOrganizationRepository {
        async fn find(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
            Ok(self.organizations.read().unwrap().get(id).cloned())
        }

        async fn create(&self, organization: Organization) -> Result<Organization, DomainError> {
            if self
                .organizations
                .read()
                .unwrap()
                .contains_key(organization.identifier())
            {
                return Err(DomainError::conflict(format!(
                    "Organization '{}' already exists",
                    organization.identifier()
                )));
            }

            Ok(self.put(organization))
        }

        async fn update(&self, organization: Organization) -> Result<Organization, DomainError> {
            if !self
                .organizations
                .read()
                .unwrap()
                .contains_key(organization.identifier())
            {
                return Err(Self::missing(organization.identifier()));
            }

            Ok(self.put(organization))
        }
    }
}
