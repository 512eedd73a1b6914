//! Storage infrastructure - PostgreSQL pooling and schema migrations

pub mod migrations;
mod postgres;

pub use migrations::{Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig};
pub(crate) use postgres::map_write_error;
