//! HTTP middleware for request processing and protection.
//!
//! Provides page caching, rate limiting, and observability middleware.

pub mod page_cache;
pub mod rate_limit;
pub mod tracing;

pub use page_cache::PageCacheRule;
