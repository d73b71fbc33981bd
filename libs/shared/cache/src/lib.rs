pub mod redis_store;

use async_trait::async_trait;
use thiserror::Error;

pub use redis_store::RedisCacheStore;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
}

/// Keyed string store with per-entry expiration. Values are JSON documents;
/// serialization stays with the caller so entries remain inspectable with
/// plain redis tooling.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry and resetting
    /// the expiration to `ttl_seconds` from now.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
