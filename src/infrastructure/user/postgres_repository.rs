//! PostgreSQL user repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::organization::OrganizationId;
use crate::domain::user::{User, UserId, UserProfile, UserRecord, UserRepository, UserStatus};
use crate::domain::versioning::{CachedAggregate, RecordFetcher, VersionProbe, VersionStamp};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_write_error;

const USER_COLUMNS: &str = "identifier, first_name, last_name, email_id, mobile_number, \
    client_id, organization_id, status, email_verified, created_at, modified_at, row_version";

/// PostgreSQL implementation of UserRepository.
///
/// Serves only active users through `fetch` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
    status_filter: Option<UserStatus>,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            status_filter: Some(UserStatus::Active),
        }
    }

    /// Serve users in `status`, or in any status when `None`
    pub fn with_status_filter(mut self, status: Option<UserStatus>) -> Self {
        self.status_filter = status;
        self
    }
}

fn not_found(id: &UserId) -> DomainError {
    DomainError::not_found(format!("User '{}' not found", id))
}

#[async_trait]
impl VersionProbe<UserId> for PostgresUserRepository {
    async fn current_version(&self, id: &UserId) -> Result<VersionStamp, DomainError> {
        let version: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT row_version FROM users WHERE identifier = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::upstream(format!("Failed to read user version: {}", e)))?;

        version.map(VersionStamp::new).ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl RecordFetcher<User, UserId> for PostgresUserRepository {
    async fn fetch(&self, id: &UserId) -> Result<User, DomainError> {
        let query = format!(
            "SELECT {} FROM users WHERE identifier = $1 AND ($2::TEXT IS NULL OR status = $2)",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .bind(self.status_filter.map(|s| s.to_string()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::upstream(format!("Failed to fetch user: {}", e)))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(not_found(id)),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE identifier = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::upstream(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let version: Vec<u8> = sqlx::query_scalar(
            r#"
            INSERT INTO users (identifier, first_name, last_name, email_id, mobile_number,
                               client_id, organization_id, status, email_verified,
                               created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING row_version
            "#,
        )
        .bind(user.identifier().as_uuid())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email_id())
        .bind(user.mobile_number())
        .bind(user.client_id())
        .bind(user.organization_id().as_uuid())
        .bind(user.status().to_string())
        .bind(user.is_email_verified())
        .bind(user.created_at())
        .bind(user.modified_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("create user", || "User already exists".to_string(), e))?;

        Ok(user.with_version(VersionStamp::new(version)))
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let version: Option<Vec<u8>> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email_id = $4, mobile_number = $5,
                status = $6, email_verified = $7, modified_at = $8
            WHERE identifier = $1
            RETURNING row_version
            "#,
        )
        .bind(user.identifier().as_uuid())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email_id())
        .bind(user.mobile_number())
        .bind(user.status().to_string())
        .bind(user.is_email_verified())
        .bind(user.modified_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                "update user",
                || format!("Email '{}' is already in use", user.email_id()),
                e,
            )
        })?;

        match version {
            Some(version) => Ok(user.with_version(VersionStamp::new(version))),
            None => Err(not_found(user.identifier())),
        }
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let decode =
        |e: sqlx::Error| DomainError::internal(format!("Invalid user row in database: {}", e));

    let identifier: Uuid = row.try_get("identifier").map_err(decode)?;
    let organization_id: Uuid = row.try_get("organization_id").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let modified_at: DateTime<Utc> = row.try_get("modified_at").map_err(decode)?;
    let version: Vec<u8> = row.try_get("row_version").map_err(decode)?;

    let record = UserRecord {
        identifier: UserId::new(identifier),
        profile: UserProfile {
            first_name: row.try_get("first_name").map_err(decode)?,
            last_name: row.try_get("last_name").map_err(decode)?,
            email_id: row.try_get("email_id").map_err(decode)?,
            mobile_number: row.try_get("mobile_number").map_err(decode)?,
        },
        client_id: row.try_get("client_id").map_err(decode)?,
        organization_id: OrganizationId::new(organization_id),
        status: status.parse()?,
        email_verified: row.try_get("email_verified").map_err(decode)?,
        created_at,
        modified_at,
        version: VersionStamp::new(version),
    };

    Ok(User::from(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::organization::{Organization, OrganizationRepository};
    use crate::infrastructure::organization::PostgresOrganizationRepository;
    use crate::infrastructure::storage::{connect_pool, Migrator, PostgresConfig, PostgresMigrator};

    // These tests require a running PostgreSQL instance
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/rowversion_cache_test".to_string());
        let pool = connect_pool(&PostgresConfig::new(url)).await.unwrap();
        PostgresMigrator::new(pool.clone()).run().await.unwrap();
        pool
    }

    async fn new_user(pool: &PgPool) -> User {
        let organizations = PostgresOrganizationRepository::new(pool.clone());
        let org = organizations
            .create(Organization::new(crate::domain::OrganizationId::generate(), "Acme").unwrap())
            .await
            .unwrap();

        User::new(
            UserId::generate(),
            UserProfile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email_id: format!("ada-{}@example.com", Uuid::new_v4()),
                mobile_number: "9876543210".to_string(),
            },
            *org.identifier(),
        )
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_inactive_user_is_filtered_from_fetch() {
        let pool = pool().await;
        let repo = PostgresUserRepository::new(pool.clone());
        let created = repo.create(new_user(&pool).await).await.unwrap();

        assert!(repo.fetch(created.identifier()).await.unwrap_err().is_not_found());
        assert_eq!(
            &repo.current_version(created.identifier()).await.unwrap(),
            created.version()
        );

        let mut verified = created.clone();
        verified.verify_email();
        let updated = repo.update(verified).await.unwrap();

        assert_ne!(updated.version(), created.version());
        let fetched = repo.fetch(created.identifier()).await.unwrap();
        assert_eq!(fetched.version(), updated.version());
        assert!(fetched.is_email_verified());
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_duplicate_email_conflicts() {
        let pool = pool().await;
        let repo = PostgresUserRepository::new(pool.clone()).with_status_filter(None);
        let user = new_user(&pool).await;

        repo.create(user.clone()).await.unwrap();

        let duplicate = User::new(
            UserId::generate(),
            UserProfile {
                first_name: "Ada".to_string(),
                last_name: "Byron".to_string(),
                email_id: user.email_id().to_string(),
                mobile_number: "9876543210".to_string(),
            },
            *user.organization_id(),
        )
        .unwrap();

        let err = repo.create(duplicate).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }
}
