//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and calls to
//! sibling services.
//!
//! # Modules
//!
//! - [`cache`] - Cache stores (Redis and in-memory) and key layout
//! - [`persistence`] - PostgreSQL and in-memory repositories
//! - [`remote`] - HTTP client for other services speaking the envelope protocol

pub mod cache;
pub mod persistence;
pub mod remote;
