//! Repository trait for generic resource records.

use async_trait::async_trait;
use serde_json::Value;

use super::transaction::Transaction;
use crate::domain::entities::{Attributes, Filter, Listing, Record};
use crate::error::AppError;

/// Which rows a lookup may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Rows that are not soft-deleted.
    #[default]
    Active,
    /// Soft-deleted rows only.
    OnlyTrashed,
}

impl Scope {
    pub fn admits(&self, record: &Record) -> bool {
        match self {
            Scope::Active => !record.is_trashed(),
            Scope::OnlyTrashed => record.is_trashed(),
        }
    }
}

/// Result of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The update was rejected; the caller rolls back.
    Failed,
    /// Saved; the caller reloads the record for the response.
    Saved,
    /// Saved; the returned value is the response payload as-is.
    Updated(Value),
}

/// Persistence contract for one resource type.
///
/// Reads run outside any transaction. Mutations and the lookup that precedes
/// them run inside the transaction returned by [`RecordRepository::begin`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRecordRepository`] - PostgreSQL (JSONB attributes)
/// - [`crate::infrastructure::persistence::MemoryRecordRepository`] - in-process, for tests and demos
#[async_trait]
pub trait RecordRepository: Send + Sync {
    type Tx: Transaction;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when no connection can be acquired.
    async fn begin(&self) -> Result<Self::Tx, AppError>;

    /// Finds a record by primary key within `scope`.
    async fn find(&self, id: i64, scope: Scope) -> Result<Option<Record>, AppError>;

    /// Finds a record by primary key inside `tx`, locking it for the mutation.
    async fn find_in(
        &self,
        tx: &mut Self::Tx,
        id: i64,
        scope: Scope,
    ) -> Result<Option<Record>, AppError>;

    /// Finds the first active record whose `field` equals `value` and that
    /// satisfies `filter`.
    async fn find_by(
        &self,
        field: &str,
        value: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, AppError>;

    /// Lists records within `scope`, newest first.
    async fn query(&self, filter: &Filter, scope: Scope) -> Result<Listing, AppError>;

    /// Creates a record. `Ok(None)` means the creation was refused.
    async fn create(
        &self,
        tx: &mut Self::Tx,
        attributes: Attributes,
    ) -> Result<Option<Record>, AppError>;

    /// Merges `attributes` into an existing record.
    async fn update(
        &self,
        tx: &mut Self::Tx,
        record: &Record,
        attributes: Attributes,
    ) -> Result<UpdateOutcome, AppError>;

    /// Soft-deletes a record. `Ok(false)` means nothing was deleted.
    async fn delete(&self, tx: &mut Self::Tx, record: &Record) -> Result<bool, AppError>;

    /// Permanently removes a soft-deleted record.
    async fn force_delete(&self, tx: &mut Self::Tx, record: &Record) -> Result<bool, AppError>;

    /// Clears the soft-delete marker.
    async fn restore(&self, tx: &mut Self::Tx, record: &Record) -> Result<bool, AppError>;
}
