//! Input validation for store and update.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use validator::Validate;

use crate::domain::entities::Attributes;
use crate::error::AppError;

/// Validates and sanitizes the attributes a client submits.
///
/// The returned map is what reaches the repository.
pub trait Form: Send + Sync {
    fn validate(&self, input: Attributes) -> Result<Attributes, AppError>;
}

/// Accepts any input, dropping `_`-prefixed control keys and `id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughForm;

impl Form for PassThroughForm {
    fn validate(&self, input: Attributes) -> Result<Attributes, AppError> {
        Ok(strip_control_keys(input))
    }
}

fn strip_control_keys(input: Attributes) -> Attributes {
    input
        .into_iter()
        .filter(|(key, _)| !key.starts_with('_') && key != "id")
        .collect()
}

/// Validates input against a typed schema.
///
/// The input is deserialized into `T`, checked with `validator`, then
/// serialized back; fields `T` does not declare are dropped. `None` fields are
/// dropped as well so a partial update never nulls out stored attributes.
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Validate)]
/// struct ArticleForm {
///     #[validate(length(min = 1, max = 200, message = "标题长度不正确"))]
///     title: String,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     body: Option<String>,
/// }
///
/// let form = TypedForm::<ArticleForm>::new();
/// ```
pub struct TypedForm<T> {
    _schema: PhantomData<fn() -> T>,
}

impl<T> TypedForm<T> {
    pub fn new() -> Self {
        Self {
            _schema: PhantomData,
        }
    }
}

impl<T> Default for TypedForm<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Form for TypedForm<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    fn validate(&self, input: Attributes) -> Result<Attributes, AppError> {
        let input = strip_control_keys(input);

        let parsed: T = serde_json::from_value(Value::Object(input)).map_err(|e| {
            AppError::validation(e.to_string(), json!({ "_input": [e.to_string()] }))
        })?;

        parsed.validate()?;

        match serde_json::to_value(&parsed) {
            Ok(Value::Object(map)) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
            Ok(_) => Err(AppError::internal(
                "Form schema must serialize to an object",
                Value::Null,
            )),
            Err(e) => Err(AppError::internal(
                "Failed to serialize validated form",
                json!({ "error": e.to_string() }),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RestCode;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Validate)]
    struct ArticleForm {
        #[validate(length(min = 1, message = "标题不能为空"))]
        title: String,
        body: Option<String>,
    }

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_pass_through_strips_control_keys() {
        let out = PassThroughForm
            .validate(attrs(json!({"title": "a", "_token": "x", "id": 9})))
            .unwrap();
        assert_eq!(out, attrs(json!({"title": "a"})));
    }

    #[test]
    fn test_typed_form_accepts_valid_input() {
        let form = TypedForm::<ArticleForm>::new();
        let out = form
            .validate(attrs(json!({"title": "a", "extra": true})))
            .unwrap();

        assert_eq!(out, attrs(json!({"title": "a"})));
    }

    #[test]
    fn test_typed_form_reports_field_errors() {
        let form = TypedForm::<ArticleForm>::new();
        let err = form.validate(attrs(json!({"title": ""}))).unwrap_err();

        assert_eq!(err.code(), RestCode::DATA_VALIDATE_FAIL);
        assert_eq!(err.to_string(), "标题不能为空");
    }

    #[test]
    fn test_typed_form_rejects_wrong_shape() {
        let form = TypedForm::<ArticleForm>::new();
        let err = form.validate(attrs(json!({"title": 5}))).unwrap_err();
        assert_eq!(err.code(), RestCode::DATA_VALIDATE_FAIL);
    }
}
