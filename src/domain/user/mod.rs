//! User domain
//!
//! Users are cached under their identifier and resolvable through two alias
//! keys: the request signing client id and the login email address.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId, UserProfile, UserRecord, UserStatus};
pub use repository::UserRepository;
pub use validation::{
    validate_email, validate_mobile_number, validate_person_name, UserValidationError,
};
