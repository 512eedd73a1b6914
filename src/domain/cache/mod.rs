//! Cache domain - key/value store abstraction with TTL

mod key;
mod repository;

pub use key::CacheKey;
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::{FailOn, MockCache};
