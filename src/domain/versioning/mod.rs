//! Version-reconciled caching of aggregates
//!
//! A cached entry embeds the row version that was current when it was read. A hit
//! is only served after probing persistence for the current version; a mismatch
//! triggers a reload. Writers invalidate explicitly after committing.

mod aggregate;
mod cancellation;
mod collaborators;
mod coordinator;
mod entry;
mod invalidator;
mod version;

pub use aggregate::{AggregateId, CachedAggregate};
pub use collaborators::{RecordFetcher, VersionProbe};
pub use coordinator::{CacheCoordinator, Fetched};
pub use entry::CacheEntry;
pub use invalidator::CacheInvalidator;
pub use version::VersionStamp;

#[cfg(test)]
pub use collaborators::{MockRecordFetcher, MockVersionProbe};
