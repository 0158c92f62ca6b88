//! Caller identity forwarded by the gateway.

/// User type assumed when the gateway sends an id without a type.
pub const DEFAULT_USER_TYPE: &str = "members";

/// The user a request acts for, as asserted by `X-User` / `X-User-Type`.
///
/// Authentication happens upstream; services trust the forwarded headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub kind: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// Builds an identity from raw header values. A blank id means anonymous.
    pub fn from_headers(id: Option<&str>, kind: Option<&str>) -> Option<Self> {
        let id = id.map(str::trim).filter(|s| !s.is_empty())?;
        let kind = kind
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_USER_TYPE);
        Some(Self::new(id, kind))
    }
}
