//! Shared state of the built-in endpoints.

use std::sync::Arc;

use crate::application::services::{MetaStore, PageCache};
use crate::domain::repositories::SettingStore;
use crate::infrastructure::cache::CacheStore;

/// Services shared by every handler.
///
/// Resource routes carry their own controller as state; this state backs the
/// settings and health endpoints and is where controllers get their meta
/// store and page cache from.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn CacheStore>,
    pub settings: Arc<dyn SettingStore>,
    pub meta: MetaStore,
    pub page_cache: PageCache,
}

impl AppState {
    pub fn new(cache: Arc<dyn CacheStore>, settings: Arc<dyn SettingStore>) -> Self {
        Self {
            meta: MetaStore::new(cache.clone()),
            page_cache: PageCache::new(cache.clone()),
            cache,
            settings,
        }
    }
}
