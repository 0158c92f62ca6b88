//! Redis-backed cache implementation.

use std::collections::HashMap;
use std::time::Duration;

use super::service::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Redis cache shared by every process of a service.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Every key is prefixed so several services can share one Redis database.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `key_prefix` - namespace prepended to every key (e.g., `"blog:"`)
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: key_prefix.into(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn op_error(action: &str, key: &str, e: redis::RedisError) -> CacheError {
    warn!("Redis {} error for {}: {}", action, key, e);
    CacheError::OperationError(format!("{} {}: {}", action, key, e))
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(Some(value)) => {
                debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => Err(op_error("GET", key, e)),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        let result = match ttl.map(|t| t.as_secs()).filter(|secs| *secs > 0) {
            Some(secs) => conn.set_ex::<_, _, ()>(&full_key, value, secs).await,
            None => conn.set::<_, _, ()>(&full_key, value).await,
        };

        result.map_err(|e| op_error("SET", key, e))?;
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn forget(&self, key: &str) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        conn.del::<_, i32>(&full_key)
            .await
            .map_err(|e| op_error("DEL", key, e))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.build_key(k)).collect();
        let mut conn = self.client.clone();

        let deleted = conn
            .del::<_, i32>(&full_keys)
            .await
            .map_err(|e| op_error("DEL", "<many>", e))?;
        debug!("Cache INVALIDATE: {} of {} keys", deleted, keys.len());
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        conn.hset::<_, _, _, ()>(&full_key, field, value)
            .await
            .map_err(|e| op_error("HSET", key, e))
    }

    async fn hash_drain(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        let (fields, _deleted): (HashMap<String, String>, i32) = redis::pipe()
            .atomic()
            .hgetall(&full_key)
            .del(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| op_error("HGETALL+DEL", key, e))?;

        Ok(fields)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
