//! Data Transfer Objects for the built-in endpoints.
//!
//! Resource endpoints need none: records travel as transformed JSON inside
//! the response envelope.

pub mod health;
pub mod settings;
