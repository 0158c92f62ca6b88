//! Uniform JSON envelope: `{status, code, message, data}`.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::code::RestCode;
use super::resource::Resource;

/// Response body shared by every endpoint.
///
/// `meta` carries pagination and per-user metadata and is omitted when empty.
/// `errors` carries the field-level map of a validation failure.
///
/// # Example
///
/// ```json
/// {
///   "status": true,
///   "code": 0,
///   "message": "成功",
///   "data": { "id": 1, "title": "hello" }
/// }
/// ```
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: bool,
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl Envelope {
    /// Builds an envelope, resolving the message from the code when none is given.
    ///
    /// Empty arrays and objects are normalized to `null`.
    pub fn new(status: bool, code: RestCode, message: Option<String>, data: Value) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| code.message().to_string());

        Self {
            status,
            code: code.value(),
            message,
            data: normalize_empty(data),
            meta: Map::new(),
            errors: None,
        }
    }

    pub fn success(data: Value) -> Self {
        Self::new(true, RestCode::SUCCESS, None, data)
    }

    /// A failed envelope carrying `code`, optional `data` and an optional message override.
    pub fn error(code: RestCode, data: Value, message: Option<String>) -> Self {
        Self::new(false, code, message, data)
    }

    /// A generic failure ([`RestCode::FAIL`]) with a custom message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(false, RestCode::FAIL, Some(message.into()), Value::Null)
    }

    /// Serializes a transformed resource as a success envelope.
    ///
    /// Transformed data is kept verbatim (an empty list stays `[]`), and the
    /// resource's metadata and pagination land in `meta`.
    pub fn from_resource(resource: Resource) -> Self {
        let (data, meta) = resource.into_parts();
        Self {
            status: true,
            code: RestCode::SUCCESS.value(),
            message: RestCode::SUCCESS.message().to_string(),
            data,
            meta,
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

fn normalize_empty(data: Value) -> Value {
    match &data {
        Value::Array(items) if items.is_empty() => Value::Null,
        Value::Object(fields) if fields.is_empty() => Value::Null,
        _ => data,
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
