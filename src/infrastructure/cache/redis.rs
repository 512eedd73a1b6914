//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing, joined to keys with ':'
    pub key_prefix: Option<String>,
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Shared store backed by Redis.
///
/// Values are written with `SET .. EX`, so expiry is enforced by the server.
/// Any transport failure surfaces as `DomainError::Upstream`.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

fn upstream(action: &str, key: &str, e: RedisError) -> DomainError {
    DomainError::upstream(format!("Redis {} failed for '{}': {}", action, key, e))
}

impl RedisCache {
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::upstream(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// All keys under this cache's prefix, found with SCAN
    async fn prefixed_keys(&self) -> Result<Vec<String>, DomainError> {
        let pattern = self.prefix_key("*");
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await
                .map_err(|e| upstream("SCAN", &pattern, e))?;

            found.extend(keys);
            cursor = next;

            if cursor == 0 {
                return Ok(found);
            }
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        conn.get(self.prefix_key(key))
            .await
            .map_err(|e| upstream("GET", key, e))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.prefix_key(key), value, ttl_secs)
            .await
            .map_err(|e| upstream("SET", key, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: u64 = conn
            .del(self.prefix_key(key))
            .await
            .map_err(|e| upstream("DEL", key, e))?;

        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        conn.exists(self.prefix_key(key))
            .await
            .map_err(|e| upstream("EXISTS", key, e))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let mut conn = self.connection.clone();

        let secs: i64 = conn
            .ttl(self.prefix_key(key))
            .await
            .map_err(|e| upstream("TTL", key, e))?;

        // -2: no such key, -1: no expiry
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        if self.config.key_prefix.is_none() {
            return redis::cmd("FLUSHDB")
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| upstream("FLUSHDB", "*", e));
        }

        let keys = self.prefixed_keys().await?;

        for chunk in keys.chunks(500) {
            conn.del::<_, ()>(chunk)
                .await
                .map_err(|e| upstream("DEL", "*", e))?;
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        if self.config.key_prefix.is_some() {
            return Ok(self.prefixed_keys().await?.len());
        }

        let mut conn = self.connection.clone();

        redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .map_err(|e| upstream("DBSIZE", "*", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("rowversion-test")
    }

    #[test]
    fn test_config_builder() {
        let config = test_config();
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.key_prefix.as_deref(), Some("rowversion-test"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let err = RedisCache::new(RedisCacheConfig::new("not a url"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_get_ttl() {
        let cache = RedisCache::new(test_config()).await.unwrap();

        cache
            .set_raw("Organization-1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get_raw("Organization-1").await.unwrap(),
            Some("{}".to_string())
        );
        let ttl = cache.ttl("Organization-1").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(60));

        cache.clear().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_is_idempotent() {
        let cache = RedisCache::new(test_config()).await.unwrap();

        cache
            .set_raw("User-1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("User-1").await.unwrap());
        assert!(!cache.delete("User-1").await.unwrap());
        assert!(cache.ttl("User-1").await.unwrap().is_none());
    }
}
