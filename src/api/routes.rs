//! Route tables for resources and the built-in endpoints.
//!
//! # Resource routes
//!
//! Mounted under the resource prefix (e.g. `/articles`) with [`resource_routes`]:
//!
//! - `GET    /`                     - list active records
//! - `POST   /`                     - create a record
//! - `GET    /trashed`              - list soft-deleted records
//! - `GET    /find/{field}/{value}` - first record with `field = value`
//! - `GET    /{id}`                 - show a record
//! - `PUT    /{id}`, `PATCH /{id}`  - partial update
//! - `DELETE /{id}`                 - soft delete
//! - `DELETE /{id}/erase`           - permanently delete a trashed record
//! - `POST   /{id}/restore`         - restore a trashed record
//!
//! # Settings routes
//!
//! - `GET /settings`, `GET /settings/{key}`, `PUT /settings`

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::api::handlers::{resource, settings};
use crate::api::middleware::{PageCacheRule, page_cache};
use crate::application::controller::RestController;
use crate::domain::repositories::RecordRepository;
use crate::state::AppState;

/// CRUD routes for one resource, with the controller as their state.
///
/// With a [`PageCacheRule`], `GET` responses are cached and served from the
/// page cache; the controller should forget the rule's groups on writes
/// (see [`RestController::with_page_cache`]).
pub fn resource_routes<R, S>(
    controller: Arc<RestController<R>>,
    page_cache: Option<PageCacheRule>,
) -> Router<S>
where
    R: RecordRepository + 'static,
    S: Clone + Send + Sync + 'static,
{
    let router = Router::new()
        .route("/", get(resource::index::<R>).post(resource::store::<R>))
        .route("/trashed", get(resource::trashed::<R>))
        .route("/find/{field}/{value}", get(resource::find_by::<R>))
        .route(
            "/{id}",
            get(resource::show::<R>)
                .put(resource::update::<R>)
                .patch(resource::update::<R>)
                .delete(resource::destroy::<R>),
        )
        .route("/{id}/erase", delete(resource::erase::<R>))
        .route("/{id}/restore", post(resource::restore::<R>));

    let router = match page_cache {
        Some(rule) => router.route_layer(middleware::from_fn_with_state(rule, page_cache::layer)),
        None => router,
    };

    router.with_state(controller)
}

/// Settings store endpoints.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(settings::list_settings).put(settings::put_settings),
        )
        .route("/{key}", get(settings::get_setting))
}
