//! Row version stamps

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Opaque change-detection token assigned by the persistence layer on every write.
///
/// Only equality is meaningful. Two stamps are equal when their bytes are equal;
/// no ordering is defined. Serialized as standard base64 so the bytes survive a
/// JSON round trip unchanged.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionStamp(Vec<u8>);

impl VersionStamp {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Stamp shaped like a SQL Server `rowversion`: eight big-endian bytes
    pub fn from_counter(counter: u64) -> Self {
        Self(counter.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl TryFrom<String> for VersionStamp {
    type Error = base64::DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        STANDARD.decode(value.as_bytes()).map(Self)
    }
}

impl From<VersionStamp> for String {
    fn from(version: VersionStamp) -> Self {
        version.to_base64()
    }
}

impl From<Vec<u8>> for VersionStamp {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for VersionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VersionStamp({})", self.to_base64())
    }
}

impl std::fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_bytewise() {
        assert_eq!(VersionStamp::new(vec![0, 0, 7]), VersionStamp::new(vec![0, 0, 7]));
        assert_ne!(VersionStamp::new(vec![0, 0, 7]), VersionStamp::new(vec![0, 7]));
        assert_ne!(VersionStamp::new(vec![1]), VersionStamp::default());
    }

    #[test]
    fn test_from_counter() {
        let version = VersionStamp::from_counter(2001);
        assert_eq!(version.as_bytes(), &[0, 0, 0, 0, 0, 0, 0x07, 0xD1]);
    }

    #[test]
    fn test_json_preserves_bytes() {
        let version = VersionStamp::new(vec![0x00, 0xFF, 0x10, 0x80, 0x00]);

        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"AP8QgAA=\"");

        let decoded: VersionStamp = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.as_bytes(), version.as_bytes());
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let result: Result<VersionStamp, _> = serde_json::from_str("\"not base64!\"");
        assert!(result.is_err());
    }
}
