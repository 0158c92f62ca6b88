//! Key-value settings contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::Attributes;
use crate::error::AppError;

/// Persisted key-value configuration.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSettingStore`] - one row per key
/// - [`crate::application::services::CachedSettingStore`] - caching decorator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Returns the stored value, else `default`, else an empty string.
    async fn get_setting(&self, key: &str, default: Option<Value>) -> Result<Value, AppError>;

    /// Upserts every entry. Returns `false` when `settings` is empty.
    async fn set_setting(&self, settings: Attributes) -> Result<bool, AppError>;

    /// All settings keyed by name.
    async fn all_to_array(&self) -> Result<Attributes, AppError>;
}

/// Value returned for a missing key.
pub fn missing_setting(default: Option<Value>) -> Value {
    default.unwrap_or_else(|| Value::String(String::new()))
}
