//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key/value store with TTL support
///
/// This trait uses JSON strings internally to be dyn-compatible.
/// Use the helper methods for typed get/set operations.
///
/// An absent or expired key is `Ok(None)`; a transport failure is an `Err`
/// (`DomainError::Upstream`). Implementations must keep the two apart.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value from the cache
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw JSON value in the cache with a TTL, replacing any previous value
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value from the cache, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Checks if a key exists in the cache
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Gets the remaining TTL for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of entries in the cache
    async fn size(&self) -> Result<usize, DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::internal(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::internal(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Which operation an injected failure applies to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailOn {
        Any,
        Get,
        Set,
        Delete,
    }

    /// Mock cache for testing
    #[derive(Debug)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
        error: Mutex<Option<(FailOn, String)>>,
        gets: AtomicUsize,
        sets: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl Default for MockCache {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockCache {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                error: Mutex::new(None),
                gets: AtomicUsize::new(0),
                sets: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            }
        }

        pub fn with_raw_entry(self, key: &str, raw: &str) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (raw.to_string(), None));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.fail_on(FailOn::Any, error);
            self
        }

        pub fn fail_on(&self, op: FailOn, error: impl Into<String>) {
            *self.error.lock().unwrap() = Some((op, error.into()));
        }

        pub fn heal(&self) {
            *self.error.lock().unwrap() = None;
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(json, _)| json.clone())
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        pub fn set_count(&self) -> usize {
            self.sets.load(Ordering::SeqCst)
        }

        pub fn get_count(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub fn delete_count(&self) -> usize {
            self.deletes.load(Ordering::SeqCst)
        }

        fn check_error(&self, op: FailOn) -> Result<(), DomainError> {
            if let Some((fail_on, error)) = self.error.lock().unwrap().clone() {
                if fail_on == FailOn::Any || fail_on == op {
                    return Err(DomainError::upstream(error));
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check_error(FailOn::Get)?;

            Ok(self.raw(key))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.check_error(FailOn::Set)?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), Some(ttl)));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.check_error(FailOn::Delete)?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
            self.check_error(FailOn::Get)?;
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(key).and_then(|(_, ttl)| *ttl))
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.check_error(FailOn::Delete)?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.check_error(FailOn::Get)?;
            Ok(self.entries.lock().unwrap().len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Option<String> = cache.get("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
            assert_eq!(cache.set_count(), 1);
            assert_eq!(cache.ttl("key1").await.unwrap(), Some(Duration::from_secs(60)));
        }

        #[tokio::test]
        async fn test_mock_cache_delete_missing_is_not_an_error() {
            let cache = MockCache::new();

            let deleted = cache.delete("missing").await.unwrap();
            assert!(!deleted);
        }

        #[tokio::test]
        async fn test_mock_cache_failure_is_upstream() {
            let cache = MockCache::new().with_error("connection refused");

            let result: Result<Option<String>, _> = cache.get("key").await;
            assert_eq!(result.unwrap_err().kind(), crate::domain::ErrorKind::Upstream);
        }

        #[tokio::test]
        async fn test_mock_cache_fail_on_set_only() {
            let cache = MockCache::new();
            cache.fail_on(FailOn::Set, "read-only replica");

            assert!(cache.get::<String>("key").await.unwrap().is_none());
            assert!(cache.set("key", &"v", Duration::from_secs(1)).await.is_err());

            cache.heal();
            assert!(cache.set("key", &"v", Duration::from_secs(1)).await.is_ok());
        }

        #[tokio::test]
        async fn test_corrupt_entry_is_internal() {
            let cache = MockCache::new().with_raw_entry("key", "{not json");

            let result: Result<Option<Vec<u8>>, _> = cache.get("key").await;
            assert_eq!(result.unwrap_err().kind(), crate::domain::ErrorKind::Internal);
        }
    }
}
