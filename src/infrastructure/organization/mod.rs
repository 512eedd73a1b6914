//! Organization infrastructure module
//!
//! In-memory and PostgreSQL repositories plus the organization service.

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresOrganizationRepository;
pub use repository::InMemoryOrganizationRepository;
pub use service::{CreateOrganizationRequest, OrganizationService};
