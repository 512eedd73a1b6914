//! Post-write invalidation for write paths

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::versioning::{CacheInvalidator, CachedAggregate};

/// Drop the cached entries of an aggregate that was just written.
///
/// The write has already committed, so a failure here is logged and swallowed.
/// A leftover entry is caught by the version check on the next read.
pub(crate) async fn invalidate_after_write<A: CachedAggregate>(
    invalidator: &CacheInvalidator<A>,
    aggregate: &A,
    cancel: &CancellationToken,
) {
    if let Err(e) = invalidator.invalidate_aggregate(aggregate, cancel).await {
        warn!(
            aggregate = A::AGGREGATE_TYPE,
            id = %aggregate.identifier(),
            error = %e,
            "Cache invalidation failed after write"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{FailOn, MockCache};
    use crate::domain::organization::{Organization, OrganizationId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let cache = Arc::new(MockCache::new());
        cache.fail_on(FailOn::Delete, "store unreachable");
        let invalidator = CacheInvalidator::<Organization>::new(cache.clone());
        let org = Organization::new(OrganizationId::generate(), "Acme").unwrap();

        invalidate_after_write(&invalidator, &org, &CancellationToken::new()).await;

        assert_eq!(cache.delete_count(), 1);
    }
}
