//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    validate_email, validate_mobile_number, validate_person_name, UserValidationError,
};
use crate::domain::cache::CacheKey;
use crate::domain::organization::OrganizationId;
use crate::domain::versioning::{AggregateId, CachedAggregate, VersionStamp};
use crate::domain::DomainError;

const CLIENT_ALIAS: &str = "UserClient";
const EMAIL_ALIAS: &str = "UserEmailId";

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AggregateId for UserId {
    fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::str::FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::invalid_argument(format!("Identifier '{}' is not valid", s)))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered but email not yet verified
    #[default]
    Inactive,
    /// Verified and allowed to log in
    Active,
}

impl UserStatus {
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(DomainError::internal(format!("Unknown user status '{}'", other))),
        }
    }
}

/// Contact details supplied at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub mobile_number: String,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), UserValidationError> {
        validate_person_name("First name", &self.first_name)?;
        validate_person_name("Last name", &self.last_name)?;
        validate_email(&self.email_id)?;
        validate_mobile_number(&self.mobile_number)
    }
}

/// Every persisted column of a user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub identifier: UserId,
    pub profile: UserProfile,
    pub client_id: Uuid,
    pub organization_id: OrganizationId,
    pub status: UserStatus,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub version: VersionStamp,
}

/// User aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    identifier: UserId,
    first_name: String,
    last_name: String,
    email_id: String,
    mobile_number: String,
    /// Public half of the request signing credentials
    client_id: Uuid,
    organization_id: OrganizationId,
    status: UserStatus,
    email_verified: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    version: VersionStamp,
}

impl User {
    /// Register a new user. Starts inactive with an unverified email.
    pub fn new(
        identifier: UserId,
        profile: UserProfile,
        organization_id: OrganizationId,
    ) -> Result<Self, UserValidationError> {
        profile.validate()?;
        let now = Utc::now();

        Ok(Self {
            identifier,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email_id: profile.email_id,
            mobile_number: profile.mobile_number,
            client_id: Uuid::new_v4(),
            organization_id,
            status: UserStatus::Inactive,
            email_verified: false,
            created_at: now,
            modified_at: now,
            version: VersionStamp::default(),
        })
    }

    pub fn with_version(mut self, version: VersionStamp) -> Self {
        self.version = version;
        self
    }

    /// Alias key resolving a client id to the cached user
    pub fn client_alias(client_id: &Uuid) -> CacheKey {
        CacheKey::new(CLIENT_ALIAS, client_id)
    }

    /// Alias key resolving an email address to the cached user
    pub fn email_alias(email_id: &str) -> CacheKey {
        CacheKey::new(EMAIL_ALIAS, email_id)
    }

    // Getters

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email_id(&self) -> &str {
        &self.email_id
    }

    pub fn mobile_number(&self) -> &str {
        &self.mobile_number
    }

    pub fn client_id(&self) -> &Uuid {
        &self.client_id
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    // Mutators

    /// Mark the email verified and activate the account
    pub fn verify_email(&mut self) {
        self.status = UserStatus::Active;
        self.email_verified = true;
        self.touch();
    }

    /// Bump the modification time so the next write gets a new row version
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            identifier: record.identifier,
            first_name: record.profile.first_name,
            last_name: record.profile.last_name,
            email_id: record.profile.email_id,
            mobile_number: record.profile.mobile_number,
            client_id: record.client_id,
            organization_id: record.organization_id,
            status: record.status,
            email_verified: record.email_verified,
            created_at: record.created_at,
            modified_at: record.modified_at,
            version: record.version,
        }
    }
}

impl CachedAggregate for User {
    type Id = UserId;

    const AGGREGATE_TYPE: &'static str = "User";

    fn identifier(&self) -> &UserId {
        &self.identifier
    }

    fn version(&self) -> &VersionStamp {
        &self.version
    }

    fn alias_keys(&self) -> Vec<CacheKey> {
        vec![
            Self::client_alias(&self.client_id),
            Self::email_alias(&self.email_id),
        ]
    }
}
