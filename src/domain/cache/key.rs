//! Cache key formatting
//!
//! Keys are `"{Namespace}-{Value}"`: the aggregate type name for primary entries
//! (`Organization-6f1c...`) and an alias name for secondary lookups
//! (`UserEmailId-ada@example.com`). Keys are case-sensitive and never normalized.

use std::fmt::{Debug, Display};

/// A deterministic cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from a namespace and a value
    pub fn new(namespace: &str, value: impl Display) -> Self {
        Self(format!("{}-{}", namespace, value))
    }

    /// Returns the string representation of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
