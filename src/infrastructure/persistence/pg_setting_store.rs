//! PostgreSQL implementation of the settings store.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Attributes;
use crate::domain::repositories::{SettingStore, missing_setting};
use crate::error::AppError;

/// Settings persisted one row per key in the `settings` table.
///
/// Values are stored as JSON text. Rows whose text is not valid JSON (written
/// by hand, for instance) are returned as plain strings.
pub struct PgSettingStore {
    pool: Arc<PgPool>,
}

impl PgSettingStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

pub(crate) fn decode_setting(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[async_trait]
impl SettingStore for PgSettingStore {
    async fn get_setting(&self, key: &str, default: Option<Value>) -> Result<Value, AppError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(match raw {
            Some(raw) => decode_setting(raw),
            None => missing_setting(default),
        })
    }

    async fn set_setting(&self, settings: Attributes) -> Result<bool, AppError> {
        if settings.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        for (key, value) in &settings {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value)
                VALUES ($1, $2)
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
                "#,
            )
            .bind(key)
            .bind(value.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = settings.len(), "Settings saved");
        Ok(true)
    }

    async fn all_to_array(&self) -> Result<Attributes, AppError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(self.pool.as_ref())
                .await?;

        Ok(rows
            .into_iter()
            .map(|(key, raw)| (key, decode_setting(raw)))
            .collect())
    }
}
