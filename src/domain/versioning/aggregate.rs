//! Traits describing what can be cached under version reconciliation

use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::version::VersionStamp;
use crate::domain::cache::CacheKey;

/// Identifier of a cached aggregate.
///
/// `Display` must produce the canonical string form; it becomes the cache key suffix.
pub trait AggregateId:
    Debug + Display + Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// The nil identifier is never a valid lookup key
    fn is_nil(&self) -> bool;
}

impl AggregateId for Uuid {
    fn is_nil(&self) -> bool {
        Uuid::is_nil(self)
    }
}

/// An aggregate whose rows carry a store-assigned [`VersionStamp`]
pub trait CachedAggregate:
    Debug + Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type Id: AggregateId;

    /// Type name used as the primary key namespace
    const AGGREGATE_TYPE: &'static str;

    fn identifier(&self) -> &Self::Id;

    /// Version that was current in persistence when this value was read
    fn version(&self) -> &VersionStamp;

    /// Secondary keys that resolve to the same entry
    fn alias_keys(&self) -> Vec<CacheKey> {
        Vec::new()
    }

    fn cache_key(id: &Self::Id) -> CacheKey {
        CacheKey::new(Self::AGGREGATE_TYPE, id)
    }
}
