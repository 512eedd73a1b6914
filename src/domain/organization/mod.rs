//! Organization domain module

mod entity;
mod repository;
mod validation;

pub use entity::{Organization, OrganizationId, OrganizationStatus};
pub use repository::OrganizationRepository;
pub use validation::{validate_organization_name, OrganizationValidationError};

#[cfg(test)]
pub use repository::mock::MockOrganizationRepository;
