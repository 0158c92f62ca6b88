//! Record entity: one row of a generic REST resource.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Field → value mapping stored on a record.
pub type Attributes = Map<String, Value>;

/// A persisted resource row.
///
/// Attributes are schemaless; identity, timestamps and the soft-delete marker
/// are kept as first-class fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a new Record instance.
    pub fn new(
        id: i64,
        attributes: Attributes,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            attributes,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    /// Returns true if the record has been soft-deleted.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Textual form of an attribute, used for equality filters.
    ///
    /// Strings compare by content; numbers and booleans by their JSON text.
    /// `id` resolves to the primary key.
    pub fn text_of(&self, field: &str) -> Option<String> {
        if field == "id" {
            return Some(self.id.to_string());
        }
        self.attributes.get(field).and_then(value_text)
    }
}

/// Textual form of a scalar JSON value; `None` for null, arrays and objects.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
