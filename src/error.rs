//! Application error type and its envelope rendering.
//!
//! Handlers return `Result<_, AppError>`. Returning an error short-circuits the
//! request: the framework boundary renders it as an [`Envelope`] with the
//! matching [`RestCode`].
//!
//! | Variant      | HTTP status         | Code                   |
//! |--------------|---------------------|------------------------|
//! | `Rest`       | 200 (configurable)  | carried code           |
//! | `Validation` | 200                 | `DATA_VALIDATE_FAIL`   |
//! | `Internal`   | 500                 | `EXCEPTION`            |

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::response::{Envelope, RestCode};

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Enables exception details in `EXCEPTION` responses.
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_debug() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A coded domain failure (object missing, create failed, remote failed...).
    #[error("{}", rest_message(.code, .message))]
    Rest {
        code: RestCode,
        message: Option<String>,
        data: Value,
        status: StatusCode,
    },

    /// Input rejected by a form; `errors` maps field names to messages.
    #[error("{message}")]
    Validation { message: String, errors: Value },

    /// Anything unexpected. Details are only rendered in debug mode.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

fn rest_message(code: &RestCode, message: &Option<String>) -> String {
    message
        .clone()
        .unwrap_or_else(|| code.message().to_string())
}

impl AppError {
    /// A coded failure with the code's default message.
    pub fn rest(code: RestCode) -> Self {
        Self::Rest {
            code,
            message: None,
            data: Value::Null,
            status: StatusCode::OK,
        }
    }

    pub fn validation(message: impl Into<String>, errors: Value) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Overrides the message of a coded failure. Other variants are unchanged.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        if let Self::Rest { message, .. } = &mut self {
            *message = Some(text.into());
        }
        self
    }

    pub fn with_data(mut self, value: Value) -> Self {
        if let Self::Rest { data, .. } = &mut self {
            *data = value;
        }
        self
    }

    pub fn with_status(mut self, value: StatusCode) -> Self {
        if let Self::Rest { status, .. } = &mut self {
            *status = value;
        }
        self
    }

    /// The code this error renders with.
    pub fn code(&self) -> RestCode {
        match self {
            Self::Rest { code, .. } => *code,
            Self::Validation { .. } => RestCode::DATA_VALIDATE_FAIL,
            Self::Internal { .. } => RestCode::EXCEPTION,
        }
    }

    /// Renders this error as an envelope without the HTTP wrapper.
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Self::Rest {
                code,
                message,
                data,
                ..
            } => Envelope::error(*code, data.clone(), message.clone()),
            Self::Validation { message, errors } => Envelope::error(
                RestCode::DATA_VALIDATE_FAIL,
                Value::Null,
                Some(message.clone()),
            )
            .with_errors(errors.clone()),
            Self::Internal { message, details } => {
                let data = if is_debug() {
                    json!({ "exception": message, "details": details })
                } else {
                    Value::Null
                };
                Envelope::error(RestCode::EXCEPTION, data, None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Rest { status, .. } => *status,
            AppError::Validation { .. } => StatusCode::OK,
            AppError::Internal { message, details } => {
                tracing::error!(error = %message, details = %details, "Unhandled error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_envelope()).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::validation(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    if matches!(e, sqlx::Error::RowNotFound) {
        return AppError::rest(RestCode::OBJ_NOT_EXIST);
    }

    AppError::internal("Database error", json!({ "error": e.to_string() }))
}

impl From<crate::infrastructure::cache::CacheError> for AppError {
    fn from(e: crate::infrastructure::cache::CacheError) -> Self {
        AppError::internal("Cache error", json!({ "error": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, e.code))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }

        let message = fields
            .values()
            .find_map(|messages| messages.first().cloned())
            .unwrap_or_else(|| RestCode::DATA_VALIDATE_FAIL.message().to_string());

        AppError::validation(message, json!(fields))
    }
}
