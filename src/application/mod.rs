//! Application layer: request orchestration on top of the domain contracts.
//!
//! Nothing here knows about HTTP; the `api` layer adapts requests into
//! [`controller::RestInput`] and renders the returned envelopes.
//!
//! # Modules
//!
//! - [`controller`] - [`controller::RestController`], generic CRUD over a repository
//! - [`transform`] - Record transformers and the named registry
//! - [`form`] - Input validation for store and update
//! - [`services`] - Page cache, per-user metadata and the settings cache decorator

pub mod controller;
pub mod form;
pub mod services;
pub mod transform;
