//! Organization entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_organization_name, OrganizationValidationError};
use crate::domain::versioning::{AggregateId, CachedAggregate, VersionStamp};
use crate::domain::DomainError;

/// Organization identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
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

impl AggregateId for OrganizationId {
    fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::str::FromStr for OrganizationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::invalid_argument(format!("Identifier '{}' is not valid", s)))
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    #[default]
    Active,
    Inactive,
}

impl OrganizationStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for OrganizationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(DomainError::internal(format!(
                "Unknown organization status '{}'",
                other
            ))),
        }
    }
}

/// Organization aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    identifier: OrganizationId,
    name: String,
    status: OrganizationStatus,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    /// Assigned by persistence on every write; empty until first persisted
    version: VersionStamp,
}

impl Organization {
    /// Create a new, not yet persisted organization
    pub fn new(
        identifier: OrganizationId,
        name: impl Into<String>,
    ) -> Result<Self, OrganizationValidationError> {
        let name = name.into();
        validate_organization_name(&name)?;
        let now = Utc::now();

        Ok(Self {
            identifier,
            name,
            status: OrganizationStatus::Active,
            created_at: now,
            modified_at: now,
            version: VersionStamp::default(),
        })
    }

    /// Rebuild an organization from a persisted row
    pub fn from_persisted(
        identifier: OrganizationId,
        name: String,
        status: OrganizationStatus,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
        version: VersionStamp,
    ) -> Self {
        Self {
            identifier,
            name,
            status,
            created_at,
            modified_at,
            version,
        }
    }

    pub fn with_version(mut self, version: VersionStamp) -> Self {
        self.version = version;
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> OrganizationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    // Mutators

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), OrganizationValidationError> {
        let name = name.into();
        validate_organization_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.status = OrganizationStatus::Inactive;
        self.touch();
    }

    pub fn activate(&mut self) {
        if self.status == OrganizationStatus::Inactive {
            self.status = OrganizationStatus::Active;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl CachedAggregate for Organization {
    type Id = OrganizationId;

    const AGGREGATE_TYPE: &'static str = "Organization";

    fn identifier(&self) -> &OrganizationId {
        &self.identifier
    }

    fn version(&self) -> &VersionStamp {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_creation() {
        let org = Organization::new(OrganizationId::generate(), "Acme").unwrap();

        assert_eq!(org.name(), "Acme");
        assert!(org.status().is_active());
        assert!(org.version().is_empty());
    }

    #[test]
    fn test_invalid_name() {
        assert!(Organization::new(OrganizationId::generate(), "").is_err());
        assert!(Organization::new(OrganizationId::generate(), "<b>Acme</b>").is_err());
    }

    #[test]
    fn test_cache_key() {
        let id: OrganizationId = "0b7e3f5e-3c1a-4f4e-8a55-2d4b8e6f9c10".parse().unwrap();
        assert_eq!(
            Organization::cache_key(&id).as_str(),
            "Organization-0b7e3f5e-3c1a-4f4e-8a55-2d4b8e6f9c10"
        );
    }

    #[test]
    fn test_parse_invalid_identifier() {
        let err = "not-a-uuid".parse::<OrganizationId>().unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rename_touches_modified_at() {
        let mut org = Organization::new(OrganizationId::generate(), "Acme").unwrap();
        let before = org.modified_at();

        std::thread::sleep(std::time::Duration::from_millis(10));

        org.rename("Acme Corp").unwrap();
        assert_eq!(org.name(), "Acme Corp");
        assert!(org.modified_at() > before);
    }

    #[test]
    fn test_status_round_trip() {
        let mut org = Organization::new(OrganizationId::generate(), "Acme").unwrap();
        org.deactivate();
        assert_eq!(org.status(), OrganizationStatus::Inactive);
        assert_eq!("inactive".parse::<OrganizationStatus>().unwrap(), org.status());

        org.activate();
        assert!(org.status().is_active());
    }
}
