//! HTTP request handlers for API endpoints.
//!
//! - [`resource`] - generic CRUD handlers driven by a `RestController`
//! - [`settings`] - settings store endpoints
//! - [`health`] - service health check

pub mod health;
pub mod resource;
pub mod settings;

pub use health::health_handler;
pub use settings::{get_setting, list_settings, put_settings};
