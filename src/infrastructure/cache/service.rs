//! Cache store trait and error types.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Process-wide key-value cache shared by the page cache, the meta store and
/// the settings decorator.
///
/// Values are opaque strings (callers store JSON). Callers treat failures as
/// misses: a broken cache degrades to uncached behavior, never to a failed
/// request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, shared across processes
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process, for tests and single-node setups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads a string entry. Expired or missing entries are `Ok(None)`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Writes a string entry; `ttl = None` keeps it until deleted.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes one entry of any kind.
    async fn forget(&self, key: &str) -> CacheResult<()>;

    /// Removes every listed entry. An empty list is a no-op.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<()>;

    /// Sets one field of a hash entry, creating the hash when missing.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()>;

    /// Atomically reads and removes a whole hash entry.
    ///
    /// Two concurrent drains of the same key never both observe a field.
    async fn hash_drain(&self, key: &str) -> CacheResult<HashMap<String, String>>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
