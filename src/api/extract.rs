//! Request extraction into [`RestInput`].

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, MatchedPath, Query, RawPathParams, Request},
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::application::controller::RestInput;
use crate::domain::entities::{Attributes, UserIdentity};
use crate::error::AppError;
use crate::response::RestCode;

/// Header carrying the authenticated user id, set by the gateway.
pub const USER_HEADER: &str = "x-user";
/// Header carrying the authenticated user type.
pub const USER_TYPE_HEADER: &str = "x-user-type";

impl<S> FromRequest<S> for RestInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let query = match Query::<Vec<(String, String)>>::from_request_parts(&mut parts, state)
            .await
        {
            Ok(Query(pairs)) => pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
            Err(e) => {
                return Err(AppError::validation(
                    e.body_text(),
                    json!({ "_query": [e.body_text()] }),
                ));
            }
        };

        let route_params = RawPathParams::from_request_parts(&mut parts, state)
            .await
            .map(|params| {
                params
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let route_template = parts
            .extensions
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string());

        let user = user_from_headers(&parts.headers);

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| AppError::rest(RestCode::DATA_JSON_FAIL).with_message(e.body_text()))?;

        Ok(RestInput {
            query,
            body: parse_body(&bytes)?,
            route_params,
            route_template,
            user,
        })
    }
}

/// Reads the gateway identity headers.
pub fn user_from_headers(headers: &HeaderMap) -> Option<UserIdentity> {
    let read = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    UserIdentity::from_headers(read(USER_HEADER), read(USER_TYPE_HEADER))
}

/// Decodes a request body into attributes. An empty body is an empty map.
pub(crate) fn parse_body(bytes: &[u8]) -> Result<Attributes, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Attributes::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::rest(RestCode::DATA_JSON_FAIL)
            .with_message("请求数据必须是JSON对象")),
        Err(e) => Err(AppError::rest(RestCode::DATA_JSON_FAIL)
            .with_data(json!({ "error": e.to_string() }))),
    }
}
