//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod organization;
pub mod user;
pub mod versioning;

pub use cache::{Cache, CacheExt, CacheKey};
pub use error::{DomainError, ErrorKind};
pub use organization::{
    validate_organization_name, Organization, OrganizationId, OrganizationRepository,
    OrganizationStatus, OrganizationValidationError,
};
pub use user::{User, UserId, UserProfile, UserRecord, UserRepository, UserStatus, UserValidationError};
pub use versioning::{
    AggregateId, CacheCoordinator, CacheEntry, CacheInvalidator, CachedAggregate, Fetched,
    RecordFetcher, VersionProbe, VersionStamp,
};
