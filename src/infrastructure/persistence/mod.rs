//! Record and settings persistence.
//!
//! # Repositories
//!
//! - [`PgRecordRepository`] - Resource rows in PostgreSQL (JSONB attributes)
//! - [`MemoryRecordRepository`] - Process-local resource rows
//! - [`PgSettingStore`] - Key-value settings in PostgreSQL
//! - [`MemorySettingStore`] - Process-local settings

pub mod memory_record_repository;
pub mod memory_setting_store;
pub mod pg_record_repository;
pub mod pg_setting_store;

pub use memory_record_repository::{MemoryRecordRepository, MemoryTransaction};
pub use memory_setting_store::MemorySettingStore;
pub use pg_record_repository::{PgRecordRepository, PgTransaction};
pub use pg_setting_store::PgSettingStore;
