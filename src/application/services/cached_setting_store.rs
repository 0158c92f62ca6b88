//! Caching decorator for settings stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::entities::Attributes;
use crate::domain::repositories::{SettingStore, missing_setting};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheKey, CacheStore};

/// Serves settings from a cached snapshot of the whole table.
///
/// Every write invalidates the snapshot and caches a fresh one for `ttl`, so
/// a snapshot loaded by a concurrent read before the write is overwritten.
/// When the reload fails the next read repopulates it. Cache failures fall
/// through to the inner store.
pub struct CachedSettingStore<S: SettingStore> {
    inner: S,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl<S: SettingStore> CachedSettingStore<S> {
    pub fn new(inner: S, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn cached_snapshot(&self) -> Option<Attributes> {
        let key = CacheKey::Settings.to_string();
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Some(map),
                _ => {
                    warn!("Discarding unreadable settings snapshot");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Settings cache read failed");
                None
            }
        }
    }

    /// Loads the inner store and caches the result.
    async fn refresh(&self) -> Result<Attributes, AppError> {
        let all = self.inner.all_to_array().await?;

        let encoded = Value::Object(all.clone()).to_string();
        if let Err(e) = self
            .cache
            .put(&CacheKey::Settings.to_string(), &encoded, Some(self.ttl))
            .await
        {
            warn!(error = %e, "Failed to cache settings snapshot");
        }

        Ok(all)
    }
}

#[async_trait]
impl<S: SettingStore> SettingStore for CachedSettingStore<S> {
    async fn get_setting(&self, key: &str, default: Option<Value>) -> Result<Value, AppError> {
        let all = self.all_to_array().await?;
        Ok(all
            .get(key)
            .cloned()
            .unwrap_or_else(|| missing_setting(default)))
    }

    async fn set_setting(&self, settings: Attributes) -> Result<bool, AppError> {
        let result = self.inner.set_setting(settings).await?;

        if let Err(e) = self.cache.forget(&CacheKey::Settings.to_string()).await {
            warn!(error = %e, "Failed to invalidate settings cache");
        }
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Failed to reload settings after write");
        }

        Ok(result)
    }

    async fn all_to_array(&self) -> Result<Attributes, AppError> {
        if let Some(snapshot) = self.cached_snapshot().await {
            debug!("Settings served from cache");
            return Ok(snapshot);
        }

        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockSettingStore;
    use crate::infrastructure::cache::{CacheError, MemoryCache, MockCacheStore};
    use crate::infrastructure::persistence::MemorySettingStore;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_reads_hit_inner_once() {
        let mut inner = MockSettingStore::new();
        inner
            .expect_all_to_array()
            .times(1)
            .returning(|| Ok(attrs(json!({"site": "blog"}))));

        let store = CachedSettingStore::new(
            inner,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
        );

        assert_eq!(store.get_setting("site", None).await.unwrap(), json!("blog"));
        assert_eq!(store.get_setting("site", None).await.unwrap(), json!("blog"));
        assert_eq!(
            store.get_setting("missing", Some(json!(1))).await.unwrap(),
            json!(1)
        );
    }

    #[tokio::test]
    async fn test_read_after_write() {
        let store = CachedSettingStore::new(
            MemorySettingStore::new(),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
        );

        store.set_setting(attrs(json!({"site": "a"}))).await.unwrap();
        assert_eq!(store.get_setting("site", None).await.unwrap(), json!("a"));

        store.set_setting(attrs(json!({"site": "b"}))).await.unwrap();
        assert_eq!(store.get_setting("site", None).await.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_write_replaces_stale_snapshot() {
        let cache = Arc::new(MemoryCache::new());
        let key = CacheKey::Settings.to_string();
        // A read that loaded the table before the write lands its snapshot late.
        cache
            .put(&key, &json!({"site": "a"}).to_string(), None)
            .await
            .unwrap();

        let mut inner = MockSettingStore::new();
        inner.expect_set_setting().times(1).returning(|_| Ok(true));
        inner
            .expect_all_to_array()
            .times(1)
            .returning(|| Ok(attrs(json!({"site": "b"}))));

        let store = CachedSettingStore::new(inner, cache.clone(), Duration::from_secs(60));

        assert!(store.set_setting(attrs(json!({"site": "b"}))).await.unwrap());

        let cached: Value = serde_json::from_str(&cache.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(cached, json!({"site": "b"}));
        assert_eq!(store.get_setting("site", None).await.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_broken_cache_falls_through() {
        let mut cache = MockCacheStore::new();
        cache
            .expect_get()
            .returning(|_| Err(CacheError::ConnectionError("down".into())));
        cache
            .expect_put()
            .returning(|_, _, _| Err(CacheError::ConnectionError("down".into())));
        cache
            .expect_forget()
            .returning(|_| Err(CacheError::ConnectionError("down".into())));

        let store = CachedSettingStore::new(
            MemorySettingStore::new(),
            Arc::new(cache),
            Duration::from_secs(60),
        );

        assert!(store.set_setting(attrs(json!({"k": 1}))).await.unwrap());
        assert_eq!(store.get_setting("k", None).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_inner_errors_propagate() {
        let mut inner = MockSettingStore::new();
        inner
            .expect_set_setting()
            .returning(|_| Err(AppError::internal("Database error", Value::Null)));

        let store = CachedSettingStore::new(
            inner,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
        );

        assert!(store.set_setting(attrs(json!({"k": 1}))).await.is_err());
    }
}
