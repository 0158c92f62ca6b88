//! Small parsing helpers shared by the middleware and configuration.
//!
//! - [`ttl`] - `1h30m`-style TTL directives
//! - [`template`] - `{name}` placeholder substitution

pub mod template;
pub mod ttl;
