//! Caching layer shared by the page cache, meta store and settings decorator.
//!
//! Provides a [`CacheStore`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - Process-local cache for tests and single-node setups
//!
//! Keys are always built through [`CacheKey`].

mod keys;
mod memory_cache;
mod redis_cache;
mod service;

pub use keys::CacheKey;
pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheStore};

#[cfg(test)]
pub use service::MockCacheStore;
