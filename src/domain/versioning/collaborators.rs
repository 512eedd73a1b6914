//! Read-side persistence contracts consumed by the cache coordinator

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::aggregate::AggregateId;
use super::version::VersionStamp;
use crate::domain::DomainError;

/// Reads only the current version stamp of an aggregate.
///
/// Must not load the full record. Fails with `NotFound` when the row is absent.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionProbe<K: AggregateId>: Send + Sync {
    async fn current_version(&self, id: &K) -> Result<VersionStamp, DomainError>;
}

/// Loads the full aggregate from persistence.
///
/// Fails with `NotFound` when the row is absent and `Upstream` on transport errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordFetcher<A: Send + Sync + 'static, K: AggregateId>: Send + Sync {
    async fn fetch(&self, id: &K) -> Result<A, DomainError>;
}
