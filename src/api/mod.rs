//! HTTP API layer.
//!
//! - [`extract`] - builds a `RestInput` from a request
//! - [`handlers`] - endpoint handlers
//! - [`dto`] - response DTOs of the built-in endpoints
//! - [`middleware`] - page cache, rate limiting, tracing
//! - [`routes`] - route tables

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
