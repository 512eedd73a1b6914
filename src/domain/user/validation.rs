//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("{field} cannot be empty")]
    EmptyName { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    NameTooLong { field: &'static str, max: usize },

    #[error("{field} contains invalid character: '{found}'. Only letters, digits and spaces are allowed")]
    InvalidNameCharacter { field: &'static str, found: char },

    #[error("Email address '{0}' is not valid")]
    InvalidEmail(String),

    #[error("Mobile number must be exactly 10 digits")]
    InvalidMobileNumber,
}

const MAX_NAME_LENGTH: usize = 50;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").unwrap());

static MOBILE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Validate a first or last name
///
/// Rules:
/// - Cannot be empty
/// - Maximum 50 characters
/// - Only ASCII letters, digits and spaces
pub fn validate_person_name(field: &'static str, name: &str) -> Result<(), UserValidationError> {
    if name.trim().is_empty() {
        return Err(UserValidationError::EmptyName { field });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong {
            field,
            max: MAX_NAME_LENGTH,
        });
    }

    if let Some(found) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == ' '))
    {
        return Err(UserValidationError::InvalidNameCharacter { field, found });
    }

    Ok(())
}

/// Validate an email address. Markup never matches the pattern.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

pub fn validate_mobile_number(mobile: &str) -> Result<(), UserValidationError> {
    if !MOBILE_PATTERN.is_match(mobile) {
        return Err(UserValidationError::InvalidMobileNumber);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_person_names() {
        assert!(validate_person_name("First name", "Ada").is_ok());
        assert!(validate_person_name("Last name", "Van der Berg").is_ok());
    }

    #[test]
    fn test_invalid_person_names() {
        assert_eq!(
            validate_person_name("First name", " "),
            Err(UserValidationError::EmptyName {
                field: "First name"
            })
        );
        assert!(matches!(
            validate_person_name("First name", &"a".repeat(51)),
            Err(UserValidationError::NameTooLong { max: 50, .. })
        ));
        assert!(matches!(
            validate_person_name("Last name", "<b>Ada</b>"),
            Err(UserValidationError::InvalidNameCharacter { found: '<', .. })
        ));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.lovelace+test@mail.example.co.uk").is_ok());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("<script>@example.com").is_err());
    }

    #[test]
    fn test_mobile_number() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("98765").is_err());
        assert!(validate_mobile_number("98765432100").is_err());
        assert!(validate_mobile_number("98765x3210").is_err());
    }
}
