//! PostgreSQL implementation of the record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{Attributes, Filter, Listing, Record};
use crate::domain::repositories::{RecordRepository, Scope, Transaction, UpdateOutcome};
use crate::error::AppError;

const COLUMNS: &str = "id, attributes, created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    attributes: Json<Attributes>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record::new(
            row.id,
            row.attributes.0,
            row.created_at,
            row.updated_at,
            row.deleted_at,
        )
    }
}

/// A PostgreSQL transaction; rolls back when dropped uncommitted.
pub struct PgTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), AppError> {
        self.0.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.0.rollback().await?;
        Ok(())
    }
}

/// PostgreSQL repository for one resource.
///
/// All resources share the `records` table and are partitioned by the
/// `resource` column; attributes live in a JSONB document. Field names and
/// values are always bound as parameters.
pub struct PgRecordRepository {
    pool: Arc<PgPool>,
    resource: String,
}

impl PgRecordRepository {
    /// Creates a repository for `resource` (e.g. `"articles"`).
    pub fn new(pool: Arc<PgPool>, resource: impl Into<String>) -> Self {
        Self {
            pool,
            resource: resource.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Appends the `WHERE` clause shared by listings and lookups.
    fn push_criteria(&self, qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter, scope: Scope) {
        qb.push(" WHERE resource = ");
        qb.push_bind(self.resource.clone());
        qb.push(scope_clause(scope));

        for (field, value) in &filter.conditions {
            push_field_equals(qb, field, value);
        }

        if let Some(keyword) = &filter.keyword {
            let pattern = format!("%{}%", escape_like(&keyword.term));
            qb.push(" AND (");
            for (i, field) in keyword.fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("attributes ->> ");
                qb.push_bind(field.clone());
                qb.push(" ILIKE ");
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    async fn mark(
        &self,
        tx: &mut PgTransaction,
        sql: &str,
        record: &Record,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(sql)
            .bind(&self.resource)
            .bind(record.id)
            .execute(&mut *tx.0)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn scope_clause(scope: Scope) -> &'static str {
    match scope {
        Scope::Active => " AND deleted_at IS NULL",
        Scope::OnlyTrashed => " AND deleted_at IS NOT NULL",
    }
}

fn push_field_equals(qb: &mut QueryBuilder<'_, Postgres>, field: &str, value: &str) {
    if field == "id" {
        qb.push(" AND id::text = ");
    } else {
        qb.push(" AND attributes ->> ");
        qb.push_bind(field.to_string());
        qb.push(" = ");
    }
    qb.push_bind(value.to_string());
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl RecordRepository for PgRecordRepository {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction(tx))
    }

    async fn find(&self, id: i64, scope: Scope) -> Result<Option<Record>, AppError> {
        let sql = format!(
            "SELECT {} FROM records WHERE resource = $1 AND id = $2{}",
            COLUMNS,
            scope_clause(scope)
        );

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&self.resource)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Record::from))
    }

    async fn find_in(
        &self,
        tx: &mut PgTransaction,
        id: i64,
        scope: Scope,
    ) -> Result<Option<Record>, AppError> {
        let sql = format!(
            "SELECT {} FROM records WHERE resource = $1 AND id = $2{} FOR UPDATE",
            COLUMNS,
            scope_clause(scope)
        );

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&self.resource)
            .bind(id)
            .fetch_optional(&mut *tx.0)
            .await?;

        Ok(row.map(Record::from))
    }

    async fn find_by(
        &self,
        field: &str,
        value: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM records", COLUMNS));
        self.push_criteria(&mut qb, filter, Scope::Active);
        push_field_equals(&mut qb, field, value);
        qb.push(" ORDER BY id DESC LIMIT 1");

        let row = qb
            .build_query_as::<RecordRow>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Record::from))
    }

    async fn query(&self, filter: &Filter, scope: Scope) -> Result<Listing, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM records", COLUMNS));
        self.push_criteria(&mut qb, filter, scope);
        qb.push(" ORDER BY id DESC");

        let Some(page) = filter.page else {
            let rows = qb
                .build_query_as::<RecordRow>()
                .fetch_all(self.pool.as_ref())
                .await?;
            return Ok(Listing::Items(rows.into_iter().map(Record::from).collect()));
        };

        qb.push(" LIMIT ");
        qb.push_bind(page.per_page);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<RecordRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM records");
        self.push_criteria(&mut count, filter, scope);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(Listing::Paginated {
            items: rows.into_iter().map(Record::from).collect(),
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn create(
        &self,
        tx: &mut PgTransaction,
        attributes: Attributes,
    ) -> Result<Option<Record>, AppError> {
        let sql = format!(
            "INSERT INTO records (resource, attributes) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&self.resource)
            .bind(Json(attributes))
            .fetch_optional(&mut *tx.0)
            .await?;

        Ok(row.map(Record::from))
    }

    async fn update(
        &self,
        tx: &mut PgTransaction,
        record: &Record,
        attributes: Attributes,
    ) -> Result<UpdateOutcome, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE records
            SET attributes = attributes || $3, updated_at = NOW()
            WHERE resource = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(&self.resource)
        .bind(record.id)
        .bind(Json(attributes))
        .execute(&mut *tx.0)
        .await?;

        if result.rows_affected() > 0 {
            Ok(UpdateOutcome::Saved)
        } else {
            Ok(UpdateOutcome::Failed)
        }
    }

    async fn delete(&self, tx: &mut PgTransaction, record: &Record) -> Result<bool, AppError> {
        self.mark(
            tx,
            "UPDATE records SET deleted_at = NOW() WHERE resource = $1 AND id = $2 AND deleted_at IS NULL",
            record,
        )
        .await
    }

    async fn force_delete(
        &self,
        tx: &mut PgTransaction,
        record: &Record,
    ) -> Result<bool, AppError> {
        self.mark(
            tx,
            "DELETE FROM records WHERE resource = $1 AND id = $2 AND deleted_at IS NOT NULL",
            record,
        )
        .await
    }

    async fn restore(&self, tx: &mut PgTransaction, record: &Record) -> Result<bool, AppError> {
        self.mark(
            tx,
            "UPDATE records SET deleted_at = NULL, updated_at = NOW() WHERE resource = $1 AND id = $2 AND deleted_at IS NOT NULL",
            record,
        )
        .await
    }
}
