//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access so the controller and services never see
//! a concrete backend. Implementations live in
//! `crate::infrastructure::persistence`.
//!
//! # Available Contracts
//!
//! - [`RecordRepository`] - CRUD and soft-delete operations for one resource
//! - [`Transaction`] - Request-scoped unit of work, rolled back on drop
//! - [`SettingStore`] - Key-value settings

pub mod record_repository;
pub mod setting_store;
pub mod transaction;

pub use record_repository::{RecordRepository, Scope, UpdateOutcome};
pub use setting_store::{SettingStore, missing_setting};
pub use transaction::Transaction;

#[cfg(test)]
pub use setting_store::MockSettingStore;
