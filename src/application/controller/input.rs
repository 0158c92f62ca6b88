//! Framework-neutral view of an incoming REST request.

use serde_json::Value;

use crate::domain::entities::{Attributes, UserIdentity};

/// Query parameter selecting a named list transformer.
pub const TRANSFORMER_PARAM: &str = "_transformer";

/// Everything a controller reads from a request.
///
/// Built by the `api` layer's extractor; tests construct it directly.
#[derive(Debug, Clone, Default)]
pub struct RestInput {
    /// Query string parameters.
    pub query: Attributes,
    /// JSON object body; empty for bodiless requests.
    pub body: Attributes,
    /// Path parameters in the order they appear in the route.
    pub route_params: Vec<(String, String)>,
    /// The matched route template, e.g. `/users/{user}/articles/{id}`.
    pub route_template: Option<String>,
    pub user: Option<UserIdentity>,
}

impl RestInput {
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Attributes) -> Self {
        self.body = body;
        self
    }

    pub fn with_route_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.push((name.into(), value.into()));
        self
    }

    pub fn with_route_template(mut self, template: impl Into<String>) -> Self {
        self.route_template = Some(template.into());
        self
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    /// The primary key: the last route parameter.
    pub fn key(&self) -> Option<&str> {
        self.route_params.last().map(|(_, value)| value.as_str())
    }

    /// The value of a named route parameter.
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.as_str())
    }

    /// The primary key as a record id.
    pub fn key_id(&self) -> Option<i64> {
        self.key().and_then(|key| key.trim().parse().ok())
    }

    /// The `_transformer` query parameter.
    pub fn transformer(&self) -> Option<&str> {
        self.query.get(TRANSFORMER_PARAM).and_then(Value::as_str)
    }

    /// Route parameters other than the trailing key, renamed `<name>_id`.
    ///
    /// A parameter is the trailing key when the route template ends with it;
    /// without a template the last parameter is assumed to be the key.
    /// Parameters named in `exclude` are skipped.
    pub fn parent_params(&self, exclude: &[&str]) -> Attributes {
        let is_trailing = |index: usize, name: &str| match &self.route_template {
            Some(template) => template.ends_with(&format!("{{{}}}", name)),
            None => index + 1 == self.route_params.len(),
        };

        self.route_params
            .iter()
            .enumerate()
            .filter(|(i, (name, _))| !is_trailing(*i, name) && !exclude.contains(&name.as_str()))
            .map(|(_, (name, value))| (format!("{}_id", name), Value::String(value.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_last_route_param() {
        let input = RestInput::default()
            .with_route_param("user", "3")
            .with_route_param("id", "17");

        assert_eq!(input.key(), Some("17"));
        assert_eq!(input.key_id(), Some(17));
    }

    #[test]
    fn test_key_id_rejects_non_numeric() {
        let input = RestInput::default().with_route_param("id", "abc");
        assert_eq!(input.key_id(), None);
        assert_eq!(RestInput::default().key(), None);
    }

    #[test]
    fn test_parent_params_exclude_trailing_key() {
        let input = RestInput::default()
            .with_route_template("/users/{user}/articles/{id}")
            .with_route_param("user", "3")
            .with_route_param("id", "17");

        let params = input.parent_params(&[]);
        assert_eq!(params.len(), 1);
        assert_eq!(params["user_id"], json!("3"));
    }

    #[test]
    fn test_parent_params_on_collection_route() {
        let input = RestInput::default()
            .with_route_template("/users/{user}/articles")
            .with_route_param("user", "3");

        assert_eq!(input.parent_params(&[])["user_id"], json!("3"));
    }

    #[test]
    fn test_parent_params_without_template() {
        let input = RestInput::default()
            .with_route_param("user", "3")
            .with_route_param("id", "17");

        let params = input.parent_params(&[]);
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("user_id"));
    }

    #[test]
    fn test_parent_params_exclusions() {
        let input = RestInput::default()
            .with_route_template("/users/{user}/articles/find/{field}/{value}")
            .with_route_param("user", "3")
            .with_route_param("field", "slug")
            .with_route_param("value", "hello");

        let params = input.parent_params(&["field", "value"]);
        assert_eq!(params.len(), 1);
        assert_eq!(params["user_id"], json!("3"));
    }

    #[test]
    fn test_transformer_param() {
        let input = RestInput::default().with_query(TRANSFORMER_PARAM, "brief");
        assert_eq!(input.transformer(), Some("brief"));
    }
}
