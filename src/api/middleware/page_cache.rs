//! Page caching middleware.
//!
//! Caches whole `200 OK` responses to anonymous `GET` requests under a hash of
//! the request URI and records each page in the groups named by the rule, so a
//! write can drop every page that may show stale data.
//!
//! Requests carrying a user identity always reach the handler: their
//! responses may hold that user's take-once metadata, which must neither be
//! replayed to others nor skipped for them.
//!
//! # Example
//!
//! ```rust,ignore
//! let rule = PageCacheRule::new(state.page_cache.clone(), "articles|user.{user}", "20m");
//! let router = Router::new()
//!     .route("/users/{user}/articles", get(list_articles))
//!     .route_layer(middleware::from_fn_with_state(rule, page_cache::layer));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use axum::{
    body::{self, Body},
    extract::{FromRequestParts, OriginalUri, Query, RawPathParams, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::extract::user_from_headers;
use crate::application::services::{CachedPage, PageCache};
use crate::utils::template::substitute;
use crate::utils::ttl::parse_ttl;

/// Response header set on pages served from the cache.
pub const CACHE_HIT_HEADER: &str = "x-page-cache";

/// TTL directive used when a rule does not name one.
pub const DEFAULT_TTL: &str = "10m";

/// Where and for how long the pages of a route are cached.
#[derive(Clone)]
pub struct PageCacheRule {
    cache: PageCache,
    groups: String,
    ttl: Duration,
}

impl PageCacheRule {
    /// `groups` is a `|`-separated list of group names; `{name}` placeholders
    /// are filled from route parameters, then query parameters. `ttl` is a
    /// directive such as `1h30m`; an unparsable or zero directive caches
    /// until the groups are forgotten.
    pub fn new(cache: PageCache, groups: impl Into<String>, ttl: &str) -> Self {
        Self {
            cache,
            groups: groups.into(),
            ttl: parse_ttl(ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Group names for a request with the given parameters.
    pub fn groups_for(&self, params: &HashMap<String, String>) -> Vec<String> {
        self.groups
            .split('|')
            .map(|template| substitute(template.trim(), params))
            .filter(|group| !group.is_empty())
            .collect()
    }
}

/// Middleware entry point. Install with `from_fn_with_state` as a route layer
/// so route parameters are available.
pub async fn layer(State(rule): State<PageCacheRule>, req: Request, next: Next) -> Response {
    if req.method() != Method::GET || user_from_headers(req.headers()).is_some() {
        return next.run(req).await;
    }

    let uri = request_uri(&req);

    if let Some(page) = rule.cache.lookup(&uri).await {
        debug!(uri = %uri, "Page cache hit");
        return replay(page);
    }

    let (mut parts, body) = req.into_parts();
    let params = request_params(&mut parts).await;
    let response = next.run(Request::from_parts(parts, body)).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(uri = %uri, error = %e, "Failed to buffer response for page cache");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let page = CachedPage {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        headers: content_type
            .map(|value| BTreeMap::from([(header::CONTENT_TYPE.to_string(), value.to_string())]))
            .unwrap_or_default(),
    };

    let groups = rule.groups_for(&params);
    if let Err(e) = rule.cache.store(&uri, &groups, rule.ttl, &page).await {
        warn!(uri = %uri, error = %e, "Failed to store page");
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// The full request URI, including any prefix stripped by `Router::nest`.
fn request_uri(req: &Request) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(req.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Route parameters, then query parameters for names not already taken.
async fn request_params(parts: &mut axum::http::request::Parts) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = RawPathParams::from_request_parts(parts, &())
        .await
        .map(|raw| {
            raw.iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default();

    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        for (name, value) in pairs {
            params.entry(name).or_insert(value);
        }
    }

    params
}

fn replay(page: CachedPage) -> Response {
    let mut response = Response::new(Body::from(page.content));

    for (name, value) in &page.headers {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
        .headers_mut()
        .insert(CACHE_HIT_HEADER, HeaderValue::from_static("hit"));

    response
}
