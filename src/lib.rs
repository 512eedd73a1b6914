//! Row-version cache
//!
//! Cache-aside reads for organization and user aggregates where every cached
//! entry is trusted only while its embedded row version matches the version
//! currently in persistence:
//! - Version-checked reads through a generic `CacheCoordinator`
//! - Invalidation after committed writes
//! - In-memory (moka) and Redis cache backends
//! - PostgreSQL persistence with trigger-assigned row versions

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use domain::{DomainError, UserStatus};
use infrastructure::{
    cache::CacheFactory,
    organization::{OrganizationService, PostgresOrganizationRepository},
    storage::connect_pool,
    user::{PostgresUserRepository, UserService},
};

/// Services wired against PostgreSQL and the configured cache backend
#[derive(Debug)]
pub struct AppServices {
    pub pool: PgPool,
    pub organizations: OrganizationService<PostgresOrganizationRepository>,
    pub users: UserService<PostgresUserRepository>,
}

/// Connect to persistence and the cache and build the services from configuration
pub async fn create_services_with_config(config: &AppConfig) -> Result<AppServices, DomainError> {
    let pool = connect_pool(&config.database.postgres()).await?;

    let backend = config.cache.backend()?;
    info!(cache_type = %backend.cache_type, ttl_secs = config.cache.ttl_secs, "Creating cache");
    let cache = CacheFactory::new().create(&backend).await?;
    let ttl = config.cache.ttl()?;

    let organizations = OrganizationService::new(
        Arc::new(PostgresOrganizationRepository::new(pool.clone())),
        cache.clone(),
        ttl,
    )
    .with_cache_warming(config.cache.warm_on_write);

    let user_repository = PostgresUserRepository::new(pool.clone())
        .with_status_filter(served_user_status(config.database.served_user_status.as_deref())?);

    let users = UserService::new(
        Arc::new(user_repository),
        cache,
        ttl,
        organizations.coordinator(),
    )
    .with_cache_warming(config.cache.warm_on_write);

    Ok(AppServices {
        pool,
        organizations,
        users,
    })
}

fn served_user_status(value: Option<&str>) -> Result<Option<UserStatus>, DomainError> {
    value
        .map(|status| {
            status.parse::<UserStatus>().map_err(|_| {
                DomainError::configuration(format!("Unknown served user status '{}'", status))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_served_user_status() {
        assert_eq!(served_user_status(None).unwrap(), None);
        assert_eq!(
            served_user_status(Some("active")).unwrap(),
            Some(UserStatus::Active)
        );
        assert!(matches!(
            served_user_status(Some("pending")).unwrap_err(),
            DomainError::Configuration { .. }
        ));
    }
}
