//! Organization validation

use thiserror::Error;

/// Errors that can occur during organization validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrganizationValidationError {
    #[error("Organization name cannot be empty")]
    EmptyName,

    #[error("Organization name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("Organization name contains invalid character: '{0}'. Only letters, digits and spaces are allowed")]
    InvalidNameCharacter(char),
}

const MAX_ORGANIZATION_NAME_LENGTH: usize = 100;

/// Validate an organization name
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - Maximum 100 characters
/// - Only ASCII letters, digits and spaces (this also rules out markup and script tags)
pub fn validate_organization_name(name: &str) -> Result<(), OrganizationValidationError> {
    if name.trim().is_empty() {
        return Err(OrganizationValidationError::EmptyName);
    }

    if name.chars().count() > MAX_ORGANIZATION_NAME_LENGTH {
        return Err(OrganizationValidationError::NameTooLong(
            MAX_ORGANIZATION_NAME_LENGTH,
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == ' '))
    {
        return Err(OrganizationValidationError::InvalidNameCharacter(c));
    }

    Ok(())
}
