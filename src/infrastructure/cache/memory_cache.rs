//! In-process cache implementation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::service::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Clone)]
enum Slot {
    Text {
        value: String,
        expires_at: Option<Instant>,
    },
    Hash(HashMap<String, String>),
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Slot::Text { expires_at: Some(at), .. } if *at <= now)
    }
}

/// A cache living in the current process.
///
/// Used when Redis is not configured and throughout the test suite. Entries
/// expire lazily on access. Hash drains remove the whole entry in one map
/// operation, so concurrent drains never share a field.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Slot>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        debug!("Using MemoryCache (process-local)");
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` holds a live entry of any kind.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries.get(key).is_some_and(|slot| !slot.is_expired(now))
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();

        let slot = match self.entries.get(key) {
            Some(slot) => slot.clone(),
            None => return Ok(None),
        };

        match slot {
            Slot::Text { .. } if slot.is_expired(now) => {
                self.entries.remove_if(key, |_, s| s.is_expired(now));
                Ok(None)
            }
            Slot::Text { value, .. } => Ok(Some(value)),
            Slot::Hash(_) => Err(CacheError::OperationError(format!(
                "{} holds a hash, not a string",
                key
            ))),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl
            .filter(|t| !t.is_zero())
            .map(|t| Instant::now() + t);

        self.entries.insert(
            key.to_string(),
            Slot::Text {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn forget(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Slot::Hash(HashMap::new()));

        match slot.value_mut() {
            Slot::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Slot::Text { .. } => Err(CacheError::OperationError(format!(
                "{} holds a string, not a hash",
                key
            ))),
        }
    }

    async fn hash_drain(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        match self
            .entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Hash(_)))
        {
            Some((_, Slot::Hash(fields))) => Ok(fields),
            _ => Ok(HashMap::new()),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}
