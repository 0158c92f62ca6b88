//! HTTP client for sibling services that answer with the envelope protocol.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::service_url;
use crate::domain::entities::UserIdentity;
use crate::error::AppError;
use crate::response::{Envelope, RestCode};

/// Forwarding headers copied from the inbound request in proxy mode.
pub const FORWARDED_HEADERS: [&str; 4] = [
    "x-forwarded-proto",
    "x-forwarded-port",
    "x-forwarded-host",
    "x-forwarded-for",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Service '{0}' is not configured")]
    UnknownService(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::rest(RestCode::REMOTE_FAIL).with_message(e.to_string())
    }
}

/// Calls another service on behalf of the current user.
///
/// In proxy mode (the default) each request carries `X-User`, `X-User-Type`,
/// `X-Language` and the inbound `X-Forwarded-*` headers so the callee sees the
/// original caller. Responses are returned as parsed JSON whatever the HTTP
/// status; a body that is not JSON becomes a `DATA_JSON_FAIL` envelope
/// describing the exchange.
///
/// ```ignore
/// let profile = RestClient::new()?
///     .server("users")?
///     .acting_as(&user)
///     .get("/profiles/42", &[])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Option<String>,
    user: Option<UserIdentity>,
    language: Option<String>,
    forwarded: HeaderMap,
    proxy: bool,
}

impl RestClient {
    /// Creates a client without a base URL; paths must then be absolute URLs.
    pub fn new() -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;
        Ok(Self::with_client(http))
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            base_url: None,
            user: None,
            language: None,
            forwarded: HeaderMap::new(),
            proxy: true,
        }
    }

    /// Targets a service by base URL or by name.
    ///
    /// Anything containing `://` is used as-is; other values are looked up in
    /// `SERVICE_<NAME>`.
    pub fn server(mut self, server: &str) -> Result<Self, RemoteError> {
        let base = if server.contains("://") {
            server.to_string()
        } else {
            service_url(server).ok_or_else(|| RemoteError::UnknownService(server.to_string()))?
        };
        self.base_url = Some(base);
        Ok(self)
    }

    pub fn acting_as(mut self, user: &UserIdentity) -> Self {
        self.user = Some(user.clone());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Keeps the inbound forwarding headers to replay on every call.
    pub fn forward_from(mut self, inbound: &HeaderMap) -> Self {
        for name in FORWARDED_HEADERS {
            if let Some(value) = inbound.get(name) {
                self.forwarded
                    .insert(HeaderName::from_static(name), value.clone());
            }
        }
        self
    }

    /// Disables the identity and forwarding headers.
    pub fn proxy(mut self, enabled: bool) -> Self {
        self.proxy = enabled;
        self
    }

    /// Resolves `path` against the base URL.
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) if !path.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            _ => path.to_string(),
        }
    }

    fn proxy_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !self.proxy {
            return headers;
        }

        if let Some(language) = self
            .language
            .as_deref()
            .and_then(|l| HeaderValue::from_str(l).ok())
        {
            headers.insert("x-language", language);
        }

        if let Some(user) = &self.user {
            if let Ok(id) = HeaderValue::from_str(&user.id) {
                headers.insert("x-user", id);
            }
            if let Ok(kind) = HeaderValue::from_str(&user.kind) {
                headers.insert("x-user-type", kind);
            }
        }

        for (name, value) in &self.forwarded {
            headers.insert(name.clone(), value.clone());
        }

        headers
    }

    /// Sends a request and returns the response body.
    ///
    /// # Errors
    ///
    /// Transport failures (DNS, connect, timeout, body read) are returned as
    /// [`RestCode::REMOTE_FAIL`]. HTTP error statuses are not errors.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, AppError> {
        let url = self.url(path);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .headers(self.proxy_headers());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let transport = |source| RemoteError::Transport {
            url: url.clone(),
            source,
        };

        let response = builder.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "Remote request failed");
            transport(e)
        })?;
        let status = response.status();
        let content = response.text().await.map_err(transport)?;

        debug!(%method, %url, status = status.as_u16(), "Remote response");

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => Ok(value),
            Err(e) => {
                let envelope = Envelope::error(
                    RestCode::DATA_JSON_FAIL,
                    json!({
                        "error": e.to_string(),
                        "url": url,
                        "method": method.as_str(),
                        "status": status.as_u16(),
                        "content": content,
                    }),
                    None,
                );
                serde_json::to_value(envelope)
                    .map_err(|e| AppError::internal("Failed to encode envelope", json!(e.to_string())))
            }
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AppError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str, body: Option<&Value>) -> Result<Value, AppError> {
        self.request(Method::DELETE, path, &[], body).await
    }
}
