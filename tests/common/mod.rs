#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use rest_boot::api::middleware::PageCacheRule;
use rest_boot::api::routes::resource_routes;
use rest_boot::application::controller::RestController;
use rest_boot::application::services::CachedSettingStore;
use rest_boot::domain::entities::Attributes;
use rest_boot::infrastructure::cache::MemoryCache;
use rest_boot::infrastructure::persistence::{MemoryRecordRepository, MemorySettingStore};
use rest_boot::routes::{RouterOptions, router};
use rest_boot::state::AppState;
use serde_json::Value;

pub fn attrs(value: Value) -> Attributes {
    value.as_object().cloned().expect("attributes must be an object")
}

/// A server with an `articles` resource on in-memory backends.
pub struct TestApp {
    pub server: TestServer,
    pub articles: MemoryRecordRepository,
    pub cache: Arc<MemoryCache>,
    pub state: AppState,
}

pub fn create_test_state(cache: Arc<MemoryCache>) -> AppState {
    let settings = CachedSettingStore::new(
        MemorySettingStore::new(),
        cache.clone(),
        Duration::from_secs(60),
    );
    AppState::new(cache, Arc::new(settings))
}

/// Mounts `articles` (caption `文章`, keyword search on `title`) and, nested
/// under users, `/users/{user}/posts` with route parameter merging.
pub fn create_test_app(page_cache: bool) -> TestApp {
    let cache = Arc::new(MemoryCache::new());
    let state = create_test_state(cache.clone());
    let articles = MemoryRecordRepository::new();

    let mut controller = RestController::new(Arc::new(articles.clone()))
        .with_caption("文章")
        .with_keywords(vec!["title".to_string()])
        .with_meta(state.meta.clone());

    let rule = page_cache.then(|| PageCacheRule::new(state.page_cache.clone(), "articles", "10m"));
    if page_cache {
        controller = controller.with_page_cache(state.page_cache.clone(), vec!["articles".into()]);
    }

    let posts = RestController::new(Arc::new(articles.clone())).merge_route_params(true);

    let resources = Router::new()
        .nest("/articles", resource_routes(Arc::new(controller), rule))
        .nest("/users/{user}/posts", resource_routes(Arc::new(posts), None));

    let app = router(state.clone(), resources, RouterOptions::default());

    TestApp {
        server: TestServer::new(app).expect("test server"),
        articles,
        cache,
        state,
    }
}
