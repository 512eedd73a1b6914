//! PostgreSQL organization repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::organization::{
    Organization, OrganizationId, OrganizationRepository, OrganizationStatus,
};
use crate::domain::versioning::{CachedAggregate, RecordFetcher, VersionProbe, VersionStamp};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_write_error;

/// PostgreSQL implementation of OrganizationRepository.
///
/// `row_version` is maintained by a database trigger; writes read it back with
/// `RETURNING`.
#[derive(Debug, Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn not_found(id: &OrganizationId) -> DomainError {
    DomainError::not_found(format!("Organization '{}' not found", id))
}

#[async_trait]
impl VersionProbe<OrganizationId> for PostgresOrganizationRepository {
    async fn current_version(&self, id: &OrganizationId) -> Result<VersionStamp, DomainError> {
        let version: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT row_version FROM organizations WHERE identifier = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::upstream(format!("Failed to read organization version: {}", e))
                })?;

        version.map(VersionStamp::new).ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl RecordFetcher<Organization, OrganizationId> for PostgresOrganizationRepository {
    async fn fetch(&self, id: &OrganizationId) -> Result<Organization, DomainError> {
        self.find(id).await?.ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn find(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT identifier, name, status, created_at, modified_at, row_version
            FROM organizations
            WHERE identifier = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::upstream(format!("Failed to get organization: {}", e)))?;

        row.as_ref().map(row_to_organization).transpose()
    }

    async fn create(&self, organization: Organization) -> Result<Organization, DomainError> {
        let version: Vec<u8> = sqlx::query_scalar(
            r#"
            INSERT INTO organizations (identifier, name, status, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING row_version
            "#,
        )
        .bind(organization.identifier().as_uuid())
        .bind(organization.name())
        .bind(organization.status().to_string())
        .bind(organization.created_at())
        .bind(organization.modified_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                "create organization",
                || format!("Organization '{}' already exists", organization.identifier()),
                e,
            )
        })?;

        Ok(organization.with_version(VersionStamp::new(version)))
    }

    async fn update(&self, organization: Organization) -> Result<Organization, DomainError> {
        let version: Option<Vec<u8>> = sqlx::query_scalar(
            r#"
            UPDATE organizations
            SET name = $2, status = $3, modified_at = $4
            WHERE identifier = $1
            RETURNING row_version
            "#,
        )
        .bind(organization.identifier().as_uuid())
        .bind(organization.name())
        .bind(organization.status().to_string())
        .bind(organization.modified_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::upstream(format!("Failed to update organization: {}", e)))?;

        match version {
            Some(version) => Ok(organization.with_version(VersionStamp::new(version))),
            None => Err(not_found(organization.identifier())),
        }
    }
}

fn row_to_organization(row: &sqlx::postgres::PgRow) -> Result<Organization, DomainError> {
    let decode = |e: sqlx::Error| {
        DomainError::internal(format!("Invalid organization row in database: {}", e))
    };

    let identifier: Uuid = row.try_get("identifier").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let modified_at: DateTime<Utc> = row.try_get("modified_at").map_err(decode)?;
    let version: Vec<u8> = row.try_get("row_version").map_err(decode)?;

    Ok(Organization::from_persisted(
        OrganizationId::new(identifier),
        name,
        status.parse::<OrganizationStatus>()?,
        created_at,
        modified_at,
        VersionStamp::new(version),
    ))
}
