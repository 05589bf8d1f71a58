//! Fixture-backed adapter

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::{AdapterError, AdapterResult, BackendAdapter};
use crate::models::{Attribute, RichUser, UserId};

/// Adapter serving user snapshots held in memory
///
/// Fixtures are JSON objects keyed by user id, each holding a list of
/// attributes:
///
/// ```json
/// { "42": [ { "urn": "urn:example:login", "value": "alice" } ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticAdapter {
    name: String,
    users: HashMap<UserId, RichUser>,
}

impl StaticAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: RichUser) -> Self {
        self.users.insert(user.id(), user);
        self
    }

    pub fn from_json_str(name: impl Into<String>, json: &str) -> AdapterResult<Self> {
        let raw: HashMap<String, Vec<Attribute>> = serde_json::from_str(json)
            .map_err(|e| AdapterError::MalformedResponse(format!("invalid fixture: {e}")))?;

        let mut adapter = Self::new(name);
        for (key, attributes) in raw {
            let id: UserId = key
                .parse()
                .map_err(|e| AdapterError::MalformedResponse(format!("{e}")))?;
            adapter.users.insert(id, RichUser::new(id, attributes));
        }
        Ok(adapter)
    }

    pub fn from_path(name: impl Into<String>, path: &Path) -> AdapterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Unavailable(format!(
                "Failed to read fixture file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(name, &content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl BackendAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_user_attributes(&self, user_id: UserId) -> AdapterResult<RichUser> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or(AdapterError::UserNotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::AttributeValue;

    const FIXTURE: &str = r#"{
        "42": [
            {"urn": "urn:test:login", "value": "alice"},
            {"urn": "urn:test:groups", "value": ["members"], "valueModifiedAt": "2024-05-01"}
        ],
        "43": []
    }"#;

    #[tokio::test]
    async fn test_from_json_str() {
        let adapter = StaticAdapter::from_json_str("fixture", FIXTURE).unwrap();
        assert_eq!(adapter.len(), 2);

        let user = adapter.get_user_attributes(UserId::new(42)).await.unwrap();
        assert_eq!(user.attribute_text("urn:test:login").as_deref(), Some("alice"));
        assert_eq!(
            user.attribute("urn:test:groups").value_modified_at(),
            Some("2024-05-01")
        );

        let empty = adapter.get_user_attributes(UserId::new(43)).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let adapter = StaticAdapter::new("empty");
        let err = adapter.get_user_attributes(UserId::new(1)).await.unwrap_err();
        assert_eq!(err, AdapterError::UserNotFound(UserId::new(1)));
    }

    #[tokio::test]
    async fn test_default_single_attribute_fetch() {
        let adapter = StaticAdapter::new("mem").with_user(RichUser::new(
            UserId::new(5),
            [Attribute::new("urn:test:login", "eve")],
        ));

        let attr = adapter
            .get_user_attribute(UserId::new(5), "urn:test:login")
            .await
            .unwrap();
        assert_eq!(attr.value(), &AttributeValue::from("eve"));
    }

    #[test]
    fn test_malformed_fixtures() {
        assert!(matches!(
            StaticAdapter::from_json_str("bad", "[1, 2]"),
            Err(AdapterError::MalformedResponse(_))
        ));
        assert!(matches!(
            StaticAdapter::from_json_str("bad", r#"{"alice": []}"#),
            Err(AdapterError::MalformedResponse(_))
        ));
        assert!(matches!(
            StaticAdapter::from_json_str("bad", r#"{"1": [{"urn": "u", "value": 0.5}]}"#),
            Err(AdapterError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let adapter = StaticAdapter::from_path("file", file.path()).unwrap();
        assert_eq!(adapter.name(), "file");
        assert!(!adapter.is_empty());

        let missing = StaticAdapter::from_path("file", Path::new("/nonexistent/users.json"));
        assert!(matches!(missing, Err(AdapterError::Unavailable(_))));
    }
}
