//! Record presentation: transformers and the named registry.
//!
//! A transformer turns a stored [`Record`] into the JSON a client sees. Each
//! controller owns a [`TransformerRegistry`] with an item transformer, a list
//! transformer and any number of named alternatives a client can pick with the
//! `_transformer` query parameter.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::domain::entities::{Listing, Record};
use crate::error::AppError;
use crate::response::{Pagination, Resource};

/// Name of the transformer used for single records.
pub const ITEM: &str = "default";
/// Name of the transformer used for listings.
pub const LIST: &str = "list";

/// Maps a record to its presentation.
pub trait Transformer: Send + Sync {
    fn transform(&self, record: &Record) -> Value;
}

impl<F> Transformer for F
where
    F: Fn(&Record) -> Value + Send + Sync,
{
    fn transform(&self, record: &Record) -> Value {
        self(record)
    }
}

/// Flattens a record: `id`, then every attribute, then the timestamps.
///
/// `deleted_at` only appears on trashed records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordTransformer;

impl Transformer for RecordTransformer {
    fn transform(&self, record: &Record) -> Value {
        let mut out = Map::with_capacity(record.attributes.len() + 4);
        out.insert("id".to_string(), json!(record.id));
        for (key, value) in &record.attributes {
            if key != "id" {
                out.insert(key.clone(), value.clone());
            }
        }
        out.insert("created_at".to_string(), json!(record.created_at.to_rfc3339()));
        out.insert("updated_at".to_string(), json!(record.updated_at.to_rfc3339()));
        if let Some(deleted_at) = record.deleted_at {
            out.insert("deleted_at".to_string(), json!(deleted_at.to_rfc3339()));
        }
        Value::Object(out)
    }
}

/// Named transformers of one resource.
#[derive(Clone)]
pub struct TransformerRegistry {
    transformers: HashMap<String, Arc<dyn Transformer>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        let default: Arc<dyn Transformer> = Arc::new(RecordTransformer);
        let mut transformers = HashMap::new();
        transformers.insert(ITEM.to_string(), default.clone());
        transformers.insert(LIST.to_string(), default);
        Self { transformers }
    }
}

impl TransformerRegistry {
    /// Registry where both the item and list transformer flatten records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a named transformer.
    pub fn with(mut self, name: impl Into<String>, transformer: impl Transformer + 'static) -> Self {
        self.transformers.insert(name.into(), Arc::new(transformer));
        self
    }

    pub fn item(&self) -> &dyn Transformer {
        self.transformers
            .get(ITEM)
            .map(|t| t.as_ref())
            .unwrap_or(&RecordTransformer)
    }

    pub fn list(&self) -> &dyn Transformer {
        self.transformers
            .get(LIST)
            .map(|t| t.as_ref())
            .unwrap_or(&RecordTransformer)
    }

    /// Resolves the list transformer for a request.
    ///
    /// # Errors
    ///
    /// An unknown name is rejected with `DATA_VALIDATE_FAIL` rather than
    /// silently falling back.
    pub fn select(&self, requested: Option<&str>) -> Result<&dyn Transformer, AppError> {
        match requested.filter(|name| !name.is_empty()) {
            None => Ok(self.list()),
            Some(name) => self.transformers.get(name).map(|t| t.as_ref()).ok_or_else(|| {
                AppError::validation(
                    format!("Unknown transformer '{}'", name),
                    json!({ "_transformer": [format!("Unknown transformer '{}'", name)] }),
                )
            }),
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transformers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Transforms one record.
pub fn transform_item(record: &Record, transformer: &dyn Transformer) -> Resource {
    Resource::item(transformer.transform(record))
}

/// Transforms a listing, keeping pagination when the listing is paginated.
pub fn transform_list(listing: &Listing, transformer: &dyn Transformer) -> Resource {
    let items: Vec<Value> = listing
        .items()
        .iter()
        .map(|record| transformer.transform(record))
        .collect();

    let pagination = match listing {
        Listing::Items(_) => None,
        Listing::Paginated {
            items: rows,
            page,
            per_page,
            total,
        } => Some(Pagination::new(*total, rows.len(), *per_page, *page)),
    };

    Resource::list(items, pagination)
}
