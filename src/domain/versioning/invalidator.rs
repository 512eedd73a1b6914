//! Explicit cache invalidation after writes

use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::aggregate::{AggregateId, CachedAggregate};
use super::cancellation::cancellable;
use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Removes cached entries so the next read is a cold miss.
///
/// Deleting an absent key is not an error, so invalidating twice is the same as
/// invalidating once.
pub struct CacheInvalidator<A: CachedAggregate> {
    cache: Arc<dyn Cache>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: CachedAggregate> CacheInvalidator<A> {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            _aggregate: PhantomData,
        }
    }

    /// Delete the primary entry for `id`
    pub async fn invalidate(
        &self,
        id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if id.is_nil() {
            return Err(DomainError::invalid_argument(format!(
                "{} identifier must not be empty",
                A::AGGREGATE_TYPE
            )));
        }

        let key = A::cache_key(id);
        cancellable(cancel, self.cache.delete(key.as_str())).await?;
        Ok(())
    }

    /// Delete the primary entry and every alias key of `aggregate`
    pub async fn invalidate_aggregate(
        &self,
        aggregate: &A,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        self.invalidate(aggregate.identifier(), cancel).await?;

        for alias in aggregate.alias_keys() {
            cancellable(cancel, self.cache.delete(alias.as_str())).await?;
        }

        Ok(())
    }
}

impl<A: CachedAggregate> Clone for CacheInvalidator<A> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            _aggregate: PhantomData,
        }
    }
}

impl<A: CachedAggregate> std::fmt::Debug for CacheInvalidator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidator")
            .field("aggregate", &A::AGGREGATE_TYPE)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{FailOn, MockCache};
    use crate::domain::organization::{MockOrganizationRepository, Organization, OrganizationId};
    use crate::domain::versioning::CacheCoordinator;
    use crate::domain::ErrorKind;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_next_get_after_invalidate_is_cold() {
        let cache = Arc::new(MockCache::new());
        let repo = Arc::new(MockOrganizationRepository::new());
        let coordinator: CacheCoordinator<Organization> = CacheCoordinator::new(
            cache.clone(),
            repo.clone(),
            repo.clone(),
            Duration::from_secs(60),
        );
        let invalidator = CacheInvalidator::<Organization>::new(cache.clone());
        let org = repo.put(Organization::new(OrganizationId::generate(), "Acme").unwrap());
        let cancel = CancellationToken::new();

        coordinator.get(org.identifier(), &cancel).await.unwrap();
        invalidator.invalidate(org.identifier(), &cancel).await.unwrap();

        // Version unchanged, still a cold miss
        let fetched = coordinator.get(org.identifier(), &cancel).await.unwrap();
        assert!(fetched.refreshed);
        assert_eq!(repo.fetch_calls(), 2);
        assert_eq!(repo.probe_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = Arc::new(MockCache::new());
        let invalidator = CacheInvalidator::<Organization>::new(cache.clone());
        let id = OrganizationId::generate();
        let cancel = CancellationToken::new();

        invalidator.invalidate(&id, &cancel).await.unwrap();
        invalidator.invalidate(&id, &cancel).await.unwrap();

        assert_eq!(cache.delete_count(), 2);
    }

    #[tokio::test]
    async fn test_nil_identifier_is_rejected() {
        let cache = Arc::new(MockCache::new());
        let invalidator = CacheInvalidator::<Organization>::new(cache.clone());

        let err = invalidator
            .invalidate(&OrganizationId::new(Uuid::nil()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(cache.delete_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let cache = Arc::new(MockCache::new());
        cache.fail_on(FailOn::Delete, "store unreachable");
        let invalidator = CacheInvalidator::<Organization>::new(cache);

        let err = invalidator
            .invalidate(&OrganizationId::generate(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_cancelled_invalidate_deletes_nothing() {
        let id = OrganizationId::generate();
        let key = Organization::cache_key(&id);
        let cache = Arc::new(MockCache::new().with_raw_entry(key.as_str(), "{}"));
        let invalidator = CacheInvalidator::<Organization>::new(cache.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = invalidator.invalidate(&id, &cancel).await.unwrap_err();

        assert!(matches!(err, DomainError::Cancelled));
        assert!(cache.raw(key.as_str()).is_some());
    }
}
