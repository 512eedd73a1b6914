//! Database migrations infrastructure

use async_trait::async_trait;
use sqlx::Executor;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Trait for running database migrations
#[async_trait]
pub trait Migrator: Send + Sync {
    /// Runs all pending migrations, returning how many were applied
    async fn run(&self) -> Result<usize, DomainError>;

    /// Reverts the last applied migration
    async fn revert(&self) -> Result<(), DomainError>;

    /// Returns the current migration version
    async fn version(&self) -> Result<Option<i64>, DomainError>;
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL applied in one transaction; may contain several statements
    pub up: String,
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// PostgreSQL migrator recording applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

fn upstream(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::upstream(format!("Failed to {}: {}", action, e))
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, schema_migrations())
    }

    pub fn with_migrations(pool: PgPool, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self { pool, migrations }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| upstream("create migrations table", e))?;

        Ok(())
    }

    async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| upstream("read applied migrations", e))
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| upstream("begin migration", e))?;

        (&mut *tx)
            .execute(sqlx::raw_sql(&migration.up))
            .await
            .map_err(|e| upstream(&format!("run migration {}", migration.version), e))?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| upstream(&format!("record migration {}", migration.version), e))?;

        tx.commit()
            .await
            .map_err(|e| upstream(&format!("commit migration {}", migration.version), e))?;

        info!(version = migration.version, description = %migration.description, "Applied migration");
        Ok(())
    }
}

#[async_trait]
impl Migrator for PostgresMigrator {
    async fn run(&self) -> Result<usize, DomainError> {
        self.ensure_migrations_table().await?;
        let applied = self.applied_versions().await?;
        let mut count = 0;

        for migration in self
            .migrations
            .iter()
            .filter(|m| !applied.contains(&m.version))
        {
            self.apply(migration).await?;
            count += 1;
        }

        Ok(count)
    }

    async fn revert(&self) -> Result<(), DomainError> {
        let Some(current) = self.version().await? else {
            return Ok(());
        };

        let migration = self
            .migrations
            .iter()
            .find(|m| m.version == current)
            .ok_or_else(|| {
                DomainError::internal(format!("Applied migration {} is unknown", current))
            })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| upstream("begin revert", e))?;

        (&mut *tx)
            .execute(sqlx::raw_sql(&migration.down))
            .await
            .map_err(|e| upstream(&format!("revert migration {}", current), e))?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(current)
            .execute(&mut *tx)
            .await
            .map_err(|e| upstream(&format!("remove migration record {}", current), e))?;

        tx.commit()
            .await
            .map_err(|e| upstream(&format!("commit revert {}", current), e))?;

        info!(version = current, "Reverted migration");
        Ok(())
    }

    async fn version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| upstream("read migration version", e))
    }
}

/// Schema for organizations and users.
///
/// `row_version` is assigned by a trigger on every insert and update from a
/// shared sequence, encoded as eight big-endian bytes. The application never
/// writes it.
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create row version trigger function",
            r#"
            CREATE SEQUENCE IF NOT EXISTS row_version_seq;

            CREATE OR REPLACE FUNCTION assign_row_version() RETURNS TRIGGER AS $$
            BEGIN
                NEW.row_version := int8send(nextval('row_version_seq'));
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql;
            "#,
            r#"
            DROP FUNCTION IF EXISTS assign_row_version();
            DROP SEQUENCE IF EXISTS row_version_seq;
            "#,
        ),
        Migration::new(
            2,
            "Create organizations table",
            r#"
            CREATE TABLE organizations (
                identifier UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                status VARCHAR(16) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                modified_at TIMESTAMPTZ NOT NULL,
                row_version BYTEA NOT NULL
            );

            CREATE TRIGGER organizations_row_version
                BEFORE INSERT OR UPDATE ON organizations
                FOR EACH ROW EXECUTE FUNCTION assign_row_version();
            "#,
            "DROP TABLE IF EXISTS organizations;",
        ),
        Migration::new(
            3,
            "Create users table",
            r#"
            CREATE TABLE users (
                identifier UUID PRIMARY KEY,
                first_name VARCHAR(50) NOT NULL,
                last_name VARCHAR(50) NOT NULL,
                email_id TEXT NOT NULL UNIQUE,
                mobile_number VARCHAR(10) NOT NULL,
                client_id UUID NOT NULL UNIQUE,
                organization_id UUID NOT NULL REFERENCES organizations (identifier),
                status VARCHAR(16) NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL,
                modified_at TIMESTAMPTZ NOT NULL,
                row_version BYTEA NOT NULL
            );

            CREATE INDEX idx_users_organization ON users (organization_id);

            CREATE TRIGGER users_row_version
                BEFORE INSERT OR UPDATE ON users
                FOR EACH ROW EXECUTE FUNCTION assign_row_version();
            "#,
            "DROP TABLE IF EXISTS users;",
        ),
    ]
}
