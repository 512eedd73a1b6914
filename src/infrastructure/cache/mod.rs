//! Cache infrastructure - Store backends and write-path invalidation

mod factory;
mod in_memory;
mod invalidation;
mod redis;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub(crate) use invalidation::invalidate_after_write;
pub use redis::{RedisCache, RedisCacheConfig};
