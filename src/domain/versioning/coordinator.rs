//! Cache-aside reads reconciled against the persisted row version

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::aggregate::{AggregateId, CachedAggregate};
use super::cancellation::cancellable;
use super::collaborators::{RecordFetcher, VersionProbe};
use super::entry::CacheEntry;
use crate::domain::cache::{Cache, CacheKey};
use crate::domain::DomainError;

/// An aggregate together with whether it was (re)loaded from persistence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<A> {
    pub aggregate: A,
    /// `true` when the value came from persistence on this call
    pub refreshed: bool,
}

impl<A> Fetched<A> {
    pub fn into_aggregate(self) -> A {
        self.aggregate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupOutcome {
    Miss,
    Fresh,
    Stale,
}

impl LookupOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Miss => "miss",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        }
    }
}

/// Serves aggregates from the cache, trusting an entry only while its embedded
/// version matches the version currently in persistence.
///
/// Every hit costs one version probe. A miss or a mismatch costs one full fetch
/// followed by a wholesale rewrite of the primary entry and every alias key.
/// Nothing is written once the caller's token is cancelled.
pub struct CacheCoordinator<A: CachedAggregate> {
    cache: Arc<dyn Cache>,
    probe: Arc<dyn VersionProbe<A::Id>>,
    fetcher: Arc<dyn RecordFetcher<A, A::Id>>,
    ttl: Duration,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: CachedAggregate> CacheCoordinator<A> {
    pub fn new(
        cache: Arc<dyn Cache>,
        probe: Arc<dyn VersionProbe<A::Id>>,
        fetcher: Arc<dyn RecordFetcher<A, A::Id>>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            probe,
            fetcher,
            ttl,
            _aggregate: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the aggregate for `id`, populating or refreshing the cache as needed
    pub async fn get(
        &self,
        id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<Fetched<A>, DomainError> {
        if id.is_nil() {
            return Err(DomainError::invalid_argument(format!(
                "{} identifier must not be empty",
                A::AGGREGATE_TYPE
            )));
        }

        let key = A::cache_key(id);

        match self.read_entry(&key, cancel).await? {
            Some(entry) => self.reconcile(entry, cancel).await,
            None => {
                record(A::AGGREGATE_TYPE, LookupOutcome::Miss);
                self.populate(id, cancel).await
            }
        }
    }

    /// Resolve an aggregate through one of its alias keys.
    ///
    /// Returns `None` when no entry is stored under the alias, or when a refresh
    /// shows the aggregate no longer owns it; in that case the alias is dropped.
    pub async fn get_by_alias(
        &self,
        alias: &CacheKey,
        cancel: &CancellationToken,
    ) -> Result<Option<Fetched<A>>, DomainError> {
        let Some(entry) = self.read_entry(alias, cancel).await? else {
            record(A::AGGREGATE_TYPE, LookupOutcome::Miss);
            return Ok(None);
        };

        let fetched = self.reconcile(entry, cancel).await?;

        if fetched.refreshed && !fetched.aggregate.alias_keys().contains(alias) {
            cancellable(cancel, self.cache.delete(alias.as_str())).await?;
            return Ok(None);
        }

        Ok(Some(fetched))
    }

    /// Unconditionally reload `id` from persistence and rewrite its entries
    pub async fn refresh(
        &self,
        id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<Fetched<A>, DomainError> {
        if id.is_nil() {
            return Err(DomainError::invalid_argument(format!(
                "{} identifier must not be empty",
                A::AGGREGATE_TYPE
            )));
        }

        self.populate(id, cancel).await
    }

    async fn read_entry(
        &self,
        key: &CacheKey,
        cancel: &CancellationToken,
    ) -> Result<Option<CacheEntry<A>>, DomainError> {
        match cancellable(cancel, self.cache.get_raw(key.as_str())).await? {
            Some(raw) => CacheEntry::decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn reconcile(
        &self,
        entry: CacheEntry<A>,
        cancel: &CancellationToken,
    ) -> Result<Fetched<A>, DomainError> {
        // Probe by the identifier stored in the entry, not the key used to find it
        let current = cancellable(cancel, self.probe.current_version(entry.identifier())).await?;

        if entry.is_current(&current) {
            record(A::AGGREGATE_TYPE, LookupOutcome::Fresh);
            return Ok(Fetched {
                aggregate: entry.into_aggregate(),
                refreshed: false,
            });
        }

        record(A::AGGREGATE_TYPE, LookupOutcome::Stale);
        self.populate(entry.identifier(), cancel).await
    }

    async fn populate(
        &self,
        id: &A::Id,
        cancel: &CancellationToken,
    ) -> Result<Fetched<A>, DomainError> {
        let aggregate = cancellable(cancel, self.fetcher.fetch(id)).await?;
        let entry = CacheEntry::from_aggregate(aggregate);
        let encoded = entry.encode()?;

        let primary = A::cache_key(entry.identifier());
        cancellable(cancel, self.cache.set_raw(primary.as_str(), &encoded, self.ttl)).await?;

        for alias in entry.aggregate().alias_keys() {
            cancellable(cancel, self.cache.set_raw(alias.as_str(), &encoded, self.ttl)).await?;
        }

        Ok(Fetched {
            aggregate: entry.into_aggregate(),
            refreshed: true,
        })
    }
}

impl<A: CachedAggregate> std::fmt::Debug for CacheCoordinator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("aggregate", &A::AGGREGATE_TYPE)
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn record(aggregate: &'static str, outcome: LookupOutcome) {
    metrics::counter!(
        "aggregate_cache_lookups_total",
        "aggregate" => aggregate,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}
