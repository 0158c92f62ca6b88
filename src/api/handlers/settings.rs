//! Handlers for the settings endpoints.

use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::api::dto::settings::{DEFAULT_PARAM, SettingEntry};
use crate::application::controller::RestInput;
use crate::error::AppError;
use crate::response::Envelope;
use crate::state::AppState;

/// `GET /settings` - every setting keyed by name.
pub async fn list_settings(State(state): State<AppState>) -> Result<Envelope, AppError> {
    let all = state.settings.all_to_array().await?;
    Ok(Envelope::success(Value::Object(all)))
}

/// `GET /settings/{key}?default=...`
///
/// A missing key yields the `default` query parameter, or an empty string.
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    let default = input.query.get(DEFAULT_PARAM).cloned();
    let value = state.settings.get_setting(&key, default).await?;

    let entry = SettingEntry { key, value };
    Ok(Envelope::success(json!(entry)))
}

/// `PUT /settings` - upserts every key of the JSON body.
pub async fn put_settings(
    State(state): State<AppState>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    if input.body.is_empty() {
        return Err(AppError::validation(
            "没有需要保存的设置",
            json!({ "_body": ["没有需要保存的设置"] }),
        ));
    }

    let keys = input.body.len();
    state.settings.set_setting(input.body).await?;
    tracing::info!(keys, "Settings updated");

    Ok(Envelope::success(Value::Bool(true)))
}
