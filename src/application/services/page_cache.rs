//! Whole-response caching with group invalidation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::infrastructure::cache::{CacheKey, CacheResult, CacheStore};

/// A cached response body and the headers replayed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    pub content: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Stores rendered pages under `page.<hash(uri)>` and tracks them in groups.
///
/// Each group name maps to `group.<name>`, a JSON list of the page keys
/// stored under it. Group lists never expire; [`PageCache::forget`] deletes
/// the pages a group lists. Concurrent stores into one group race on the list
/// and the last write wins.
#[derive(Clone)]
pub struct PageCache {
    cache: Arc<dyn CacheStore>,
}

impl PageCache {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Returns the cached page for `uri`. Cache errors count as misses.
    pub async fn lookup(&self, uri: &str) -> Option<CachedPage> {
        let key = CacheKey::Page(uri).to_string();

        let raw = match self.cache.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(uri, error = %e, "Page cache lookup failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(uri, error = %e, "Discarding unreadable cached page");
                None
            }
        }
    }

    /// Stores `page` for `uri` and records its key in every group.
    ///
    /// A zero `ttl` keeps the page until its groups are forgotten.
    pub async fn store(
        &self,
        uri: &str,
        groups: &[String],
        ttl: Duration,
        page: &CachedPage,
    ) -> CacheResult<()> {
        let key = CacheKey::Page(uri).to_string();

        for group in groups.iter().filter(|g| !g.is_empty()) {
            let group_key = CacheKey::Group(group).to_string();
            let mut keys = self.group_keys(&group_key).await?;
            if !keys.contains(&key) {
                keys.push(key.clone());
                self.cache
                    .put(&group_key, &encode(&keys)?, None)
                    .await?;
            }
        }

        let ttl = (!ttl.is_zero()).then_some(ttl);
        self.cache.put(&key, &encode(page)?, ttl).await?;

        debug!(uri, ?groups, ?ttl, "Page cached");
        Ok(())
    }

    /// Deletes every page listed in each group.
    ///
    /// The group lists themselves are kept; stale keys in them are harmless.
    pub async fn forget(&self, groups: &[String]) -> CacheResult<()> {
        for group in groups {
            let keys = self.group_keys(&CacheKey::Group(group).to_string()).await?;
            if keys.is_empty() {
                continue;
            }
            self.cache.delete_many(&keys).await?;
            debug!(group, count = keys.len(), "Page cache group forgotten");
        }
        Ok(())
    }

    async fn group_keys(&self, group_key: &str) -> CacheResult<Vec<String>> {
        Ok(self
            .cache
            .get(group_key)
            .await?
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default())
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    serde_json::to_string(value)
        .map_err(|e| crate::infrastructure::cache::CacheError::OperationError(e.to_string()))
}
