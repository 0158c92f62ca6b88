//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, resource mounting, and Axum
//! server lifecycle.

use crate::api::middleware::PageCacheRule;
use crate::api::routes::resource_routes;
use crate::application::controller::RestController;
use crate::application::services::CachedSettingStore;
use crate::config::Config;
use crate::domain::repositories::SettingStore;
use crate::infrastructure::cache::{CacheStore, MemoryCache, RedisCache};
use crate::infrastructure::persistence::{PgRecordRepository, PgSettingStore};
use crate::routes::{RouterOptions, app_router};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::{Router, ServiceExt};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or in-memory fallback)
/// - Settings store, cached when enabled
/// - One CRUD router per configured resource
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    crate::error::set_debug(config.debug);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let cache = connect_cache(&config).await;
    let pool = Arc::new(pool);

    let settings: Arc<dyn SettingStore> = if config.settings_cache {
        Arc::new(CachedSettingStore::new(
            PgSettingStore::new(pool.clone()),
            cache.clone(),
            config.settings_cache_ttl(),
        ))
    } else {
        Arc::new(PgSettingStore::new(pool.clone()))
    };

    let state = AppState::new(cache, settings);
    let resources = mount_resources(&config, &pool, &state);

    let options = RouterOptions {
        behind_proxy: config.behind_proxy,
        rate_limit: !config.pressure_test,
    };
    let app = app_router(state, resources, options);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheStore> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache backend: in-memory");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_prefix.clone()).await {
        Ok(redis) => {
            tracing::info!("Cache backend: Redis");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
            Arc::new(MemoryCache::new())
        }
    }
}

/// Builds `/<name>` CRUD routes for every configured resource.
fn mount_resources(config: &Config, pool: &Arc<PgPool>, state: &AppState) -> Router<AppState> {
    let mut router = Router::new();

    for resource in &config.resources {
        let repository = Arc::new(PgRecordRepository::new(pool.clone(), &resource.name));

        let mut controller = RestController::new(repository)
            .with_meta(state.meta.clone())
            .with_keywords(resource.keyword_fields.clone());
        if let Some(caption) = &resource.caption {
            controller = controller.with_caption(caption);
        }

        let rule = config.page_cache.then(|| {
            PageCacheRule::new(
                state.page_cache.clone(),
                resource.name.clone(),
                &config.page_cache_default_ttl,
            )
        });
        if rule.is_some() {
            controller =
                controller.with_page_cache(state.page_cache.clone(), vec![resource.name.clone()]);
        }

        router = router.nest(
            &format!("/{}", resource.name),
            resource_routes(Arc::new(controller), rule),
        );
        tracing::info!(resource = %resource.name, "Resource mounted");
    }

    router
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
