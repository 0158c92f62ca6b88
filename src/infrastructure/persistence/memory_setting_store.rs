//! In-memory settings store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::domain::entities::Attributes;
use crate::domain::repositories::{SettingStore, missing_setting};
use crate::error::AppError;

/// Settings kept in the current process; lost on restart.
#[derive(Debug, Default)]
pub struct MemorySettingStore {
    values: DashMap<String, Value>,
}

impl MemorySettingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingStore for MemorySettingStore {
    async fn get_setting(&self, key: &str, default: Option<Value>) -> Result<Value, AppError> {
        Ok(self
            .values
            .get(key)
            .map(|v| v.value().clone())
            .unwrap_or_else(|| missing_setting(default)))
    }

    async fn set_setting(&self, settings: Attributes) -> Result<bool, AppError> {
        if settings.is_empty() {
            return Ok(false);
        }
        for (key, value) in settings {
            self.values.insert(key, value);
        }
        Ok(true)
    }

    async fn all_to_array(&self) -> Result<Attributes, AppError> {
        let mut all: Vec<(String, Value)> = self
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all.into_iter().collect())
    }
}
