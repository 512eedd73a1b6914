use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, CacheType};
use crate::infrastructure::storage::PostgresConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Users in this status are served from the cache; unset serves every status
    #[serde(default = "default_user_status")]
    pub served_user_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(rename = "type", default)]
    pub cache_type: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Single deployment-wide TTL for every cache entry
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Re-populate the cache right after writes so alias lookups keep resolving
    #[serde(default = "default_true")]
    pub warm_on_write: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Prometheus recorder configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Install the recorder and print the exposition after each command
    #[serde(default)]
    pub enabled: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_user_status() -> Option<String> {
    Some("active".to_string())
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: PostgresConfig::default().url,
            max_connections: default_max_connections(),
            served_user_status: default_user_status(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default().to_string(),
            redis_url: None,
            key_prefix: None,
            max_capacity: default_max_capacity(),
            ttl_secs: default_ttl_secs(),
            warm_on_write: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig::new(self.url.clone()).with_max_connections(self.max_connections)
    }
}

impl CacheSettings {
    /// Entry TTL; must be at least one second and representable as a deadline
    pub fn ttl(&self) -> Result<Duration, DomainError> {
        let ttl = Duration::from_secs(self.ttl_secs);

        if self.ttl_secs == 0 || Instant::now().checked_add(ttl).is_none() {
            return Err(DomainError::configuration(format!(
                "cache.ttl_secs must be a positive number of seconds in range, got {}",
                self.ttl_secs
            )));
        }

        Ok(ttl)
    }

    /// Backend selection for the cache factory
    pub fn backend(&self) -> Result<CacheConfig, DomainError> {
        let cache_type: CacheType = if self.cache_type.is_empty() {
            CacheType::default()
        } else {
            self.cache_type.parse()?
        };

        Ok(CacheConfig {
            cache_type,
            redis_url: self.redis_url.clone(),
            key_prefix: self.key_prefix.clone(),
            max_capacity: self.max_capacity,
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
