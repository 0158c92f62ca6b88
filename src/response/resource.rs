//! Transformed payloads waiting to be wrapped in an envelope.

use serde::Serialize;
use serde_json::{Map, Value};

/// Pagination block emitted under `meta.pagination` for paginated lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub count: usize,
    pub per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, count: usize, per_page: i64, current_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            count,
            per_page,
            current_page,
            total_pages,
        }
    }
}

/// An item or list after transformation, plus the metadata that should
/// accompany it in the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    data: Value,
    pagination: Option<Pagination>,
    meta: Map<String, Value>,
}

impl Resource {
    pub fn item(data: Value) -> Self {
        Self {
            data,
            pagination: None,
            meta: Map::new(),
        }
    }

    pub fn list(items: Vec<Value>, pagination: Option<Pagination>) -> Self {
        Self {
            data: Value::Array(items),
            pagination,
            meta: Map::new(),
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn set_meta_value(&mut self, key: impl Into<String>, value: Value) {
        self.meta.insert(key.into(), value);
    }

    /// Splits into `(data, meta)`, folding pagination into `meta.pagination`.
    pub fn into_parts(self) -> (Value, Map<String, Value>) {
        let mut meta = self.meta;
        if let Some(pagination) = self.pagination {
            // Pagination is plain integers; serialization cannot fail.
            if let Ok(value) = serde_json::to_value(pagination) {
                meta.insert("pagination".to_string(), value);
            }
        }
        (self.data, meta)
    }
}
