//! Core domain entities.
//!
//! Entities are plain data structures shared by every resource:
//!
//! - [`Record`] - A persisted resource row with schemaless attributes
//! - [`Filter`] - Equality, keyword and pagination criteria for queries
//! - [`Listing`] - Plain or paginated query results
//! - [`UserIdentity`] - The caller as forwarded by the gateway

pub mod filter;
pub mod listing;
pub mod record;
pub mod user;

pub use filter::{Filter, Keyword, PageRequest};
pub use listing::Listing;
pub use record::{Attributes, Record, value_text};
pub use user::{DEFAULT_USER_TYPE, UserIdentity};
