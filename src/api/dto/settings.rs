//! DTOs for the settings endpoints.

use serde::Serialize;
use serde_json::Value;

/// Query parameter supplying the value returned for a missing key.
pub const DEFAULT_PARAM: &str = "default";

/// A single setting as returned by `GET /settings/{key}`.
#[derive(Debug, Serialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: Value,
}
