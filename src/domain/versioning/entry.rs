//! Serialized cache entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::CachedAggregate;
use super::version::VersionStamp;
use crate::domain::DomainError;

/// Snapshot of an aggregate as stored in the cache.
///
/// The embedded `version` is the stamp that was current in persistence when the
/// snapshot was read. Entries are only ever replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CacheEntry<A: CachedAggregate> {
    identifier: A::Id,
    version: VersionStamp,
    cached_at: DateTime<Utc>,
    aggregate: A,
}

impl<A: CachedAggregate> CacheEntry<A> {
    pub fn from_aggregate(aggregate: A) -> Self {
        Self {
            identifier: aggregate.identifier().clone(),
            version: aggregate.version().clone(),
            cached_at: Utc::now(),
            aggregate,
        }
    }

    pub fn identifier(&self) -> &A::Id {
        &self.identifier
    }

    pub fn version(&self) -> &VersionStamp {
        &self.version
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> A {
        self.aggregate
    }

    /// Whether this snapshot still matches the version probed from persistence
    pub fn is_current(&self, probed: &VersionStamp) -> bool {
        self.version.as_bytes() == probed.as_bytes()
    }

    pub fn encode(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| {
            DomainError::internal(format!(
                "Failed to encode {} cache entry: {}",
                A::AGGREGATE_TYPE,
                e
            ))
        })
    }

    pub fn decode(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| {
            DomainError::internal(format!(
                "Failed to decode {} cache entry: {}",
                A::AGGREGATE_TYPE,
                e
            ))
        })
    }
}
