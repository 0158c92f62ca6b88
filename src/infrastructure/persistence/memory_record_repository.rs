//! In-memory implementation of the record repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Attributes, Filter, Listing, Record};
use crate::domain::repositories::{RecordRepository, Scope, Transaction, UpdateOutcome};
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

impl Table {
    fn insert(&mut self, attributes: Attributes) -> Record {
        self.next_id += 1;
        let now = Utc::now();
        let record = Record::new(self.next_id, attributes, now, now, None);
        self.rows.insert(record.id, record.clone());
        record
    }

    fn scoped(&self, id: i64, scope: Scope) -> Option<&Record> {
        self.rows.get(&id).filter(|r| scope.admits(r))
    }

    /// Matching rows, newest first.
    fn select(&self, filter: &Filter, scope: Scope) -> Vec<Record> {
        self.rows
            .values()
            .rev()
            .filter(|r| scope.admits(r) && filter.matches(r))
            .cloned()
            .collect()
    }
}

/// A transaction over the in-memory table.
///
/// Holds the table lock for its whole lifetime, so transactions are fully
/// serialized. Changes go to a staged copy that replaces the table on commit
/// and is discarded on rollback or drop.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self) -> Result<(), AppError> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Process-local record storage.
///
/// Used by the test suite and for running services without PostgreSQL.
/// Reads wait for any open transaction to finish.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordRepository {
    table: Arc<Mutex<Table>>,
}

impl MemoryRecordRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing transactions.
    pub async fn seed(&self, attributes: Attributes) -> Record {
        self.table.lock().await.insert(attributes)
    }

    /// Inserts a record that is already soft-deleted.
    pub async fn seed_trashed(&self, attributes: Attributes) -> Record {
        let mut table = self.table.lock().await;
        let mut record = table.insert(attributes);
        record.deleted_at = Some(Utc::now());
        table.rows.insert(record.id, record.clone());
        record
    }

    /// Every stored row, trashed included, in id order.
    pub async fn all(&self) -> Vec<Record> {
        self.table.lock().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl RecordRepository for MemoryRecordRepository {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, AppError> {
        let guard = self.table.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    async fn find(&self, id: i64, scope: Scope) -> Result<Option<Record>, AppError> {
        Ok(self.table.lock().await.scoped(id, scope).cloned())
    }

    async fn find_in(
        &self,
        tx: &mut MemoryTransaction,
        id: i64,
        scope: Scope,
    ) -> Result<Option<Record>, AppError> {
        Ok(tx.staged.scoped(id, scope).cloned())
    }

    async fn find_by(
        &self,
        field: &str,
        value: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, AppError> {
        let filter = filter.clone().with_condition(field, value);
        let table = self.table.lock().await;
        Ok(table.select(&filter, Scope::Active).into_iter().next())
    }

    async fn query(&self, filter: &Filter, scope: Scope) -> Result<Listing, AppError> {
        let records = self.table.lock().await.select(filter, scope);
        Ok(Listing::from_records(records, filter.page))
    }

    async fn create(
        &self,
        tx: &mut MemoryTransaction,
        attributes: Attributes,
    ) -> Result<Option<Record>, AppError> {
        Ok(Some(tx.staged.insert(attributes)))
    }

    async fn update(
        &self,
        tx: &mut MemoryTransaction,
        record: &Record,
        attributes: Attributes,
    ) -> Result<UpdateOutcome, AppError> {
        let Some(row) = tx
            .staged
            .rows
            .get_mut(&record.id)
            .filter(|r| !r.is_trashed())
        else {
            return Ok(UpdateOutcome::Failed);
        };

        row.attributes.extend(attributes);
        row.updated_at = Utc::now();
        Ok(UpdateOutcome::Saved)
    }

    async fn delete(&self, tx: &mut MemoryTransaction, record: &Record) -> Result<bool, AppError> {
        match tx.staged.rows.get_mut(&record.id) {
            Some(row) if !row.is_trashed() => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn force_delete(
        &self,
        tx: &mut MemoryTransaction,
        record: &Record,
    ) -> Result<bool, AppError> {
        if tx.staged.scoped(record.id, Scope::OnlyTrashed).is_none() {
            return Ok(false);
        }
        Ok(tx.staged.rows.remove(&record.id).is_some())
    }

    async fn restore(&self, tx: &mut MemoryTransaction, record: &Record) -> Result<bool, AppError> {
        match tx.staged.rows.get_mut(&record.id) {
            Some(row) if row.is_trashed() => {
                row.deleted_at = None;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
