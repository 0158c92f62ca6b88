//! Per-user response metadata delivered exactly once.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::entities::UserIdentity;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheKey, CacheStore};
use crate::response::Resource;

/// Stores metadata for a user and attaches it to that user's next response.
///
/// Entries live in the cache hash `meta.<user id>`. [`MetaStore::take`]
/// drains the hash atomically, so concurrent responses for the same user never
/// both receive an entry.
#[derive(Clone)]
pub struct MetaStore {
    cache: Arc<dyn CacheStore>,
}

impl MetaStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Queues `value` under `key` for the user's next response.
    ///
    /// Saving the same key twice before a take keeps the latest value.
    pub async fn save(&self, user_id: &str, key: &str, value: &Value) -> Result<(), AppError> {
        let encoded = serde_json::to_string(value).map_err(|e| {
            AppError::internal("Failed to encode meta value", Value::String(e.to_string()))
        })?;

        self.cache
            .hash_set(&CacheKey::Meta(user_id).to_string(), key, &encoded)
            .await?;
        Ok(())
    }

    /// Drains every pending entry of the user.
    ///
    /// Anonymous requests and cache failures yield an empty map; metadata is
    /// never worth failing a response over.
    pub async fn take(&self, user: Option<&UserIdentity>) -> Map<String, Value> {
        let Some(user) = user else {
            return Map::new();
        };

        let raw = match self
            .cache
            .hash_drain(&CacheKey::Meta(&user.id).to_string())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user = %user.id, error = %e, "Failed to drain user meta");
                return Map::new();
            }
        };

        raw.into_iter()
            .map(|(key, encoded)| {
                let value = serde_json::from_str(&encoded).unwrap_or(Value::String(encoded));
                (key, value)
            })
            .collect()
    }

    /// Drains the user's metadata into `resource`.
    pub async fn take_into(&self, resource: &mut Resource, user: Option<&UserIdentity>) {
        for (key, value) in self.take(user).await {
            resource.set_meta_value(key, value);
        }
    }
}
