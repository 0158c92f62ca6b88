//! Top-level router combining resource and built-in routes.
//!
//! # Route Structure
//!
//! - `GET  /health`     - Health check: settings store, cache
//! - `/settings/*`      - Settings store
//! - `/<resource>/*`    - CRUD routes of each mounted resource
//!
//! Unknown paths answer with a `NOT_FOUND` envelope.
//!
//! # Middleware
//!
//! - **Tracing** - Request spans with the gateway user id
//! - **Rate limiting** - Per-IP token bucket, left out in pressure-test mode
//! - **Path normalization** - Trailing slash handling

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::api::routes::settings_routes;
use crate::error::AppError;
use crate::response::RestCode;
use crate::state::AppState;

/// Router-wide switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Read the client IP from forwarding headers for rate limiting.
    pub behind_proxy: bool,
    /// Apply the per-IP rate limiter.
    pub rate_limit: bool,
}

/// Constructs the application router with trailing-slash normalization.
///
/// `resources` holds the nested resource routers, typically built with
/// [`crate::api::routes::resource_routes`].
pub fn app_router(
    state: AppState,
    resources: Router<AppState>,
    options: RouterOptions,
) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, resources, options))
}

/// The application router without path normalization.
pub fn router(state: AppState, resources: Router<AppState>, options: RouterOptions) -> Router {
    let mut api = Router::new()
        .nest("/settings", settings_routes())
        .merge(resources);

    if options.rate_limit {
        api = api.layer(rate_limit::layer(options.behind_proxy));
    }

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .fallback(not_found)
        .with_state(state)
        .layer(tracing::layer())
}

async fn not_found() -> AppError {
    AppError::rest(RestCode::NOT_FOUND).with_status(StatusCode::NOT_FOUND)
}
