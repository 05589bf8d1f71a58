//! Backend attributes and rich user snapshots

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::AttributeValue;
use crate::Error;

/// Attribute returned for URNs the backend has no value for
pub static NULL_ATTRIBUTE: Attribute = Attribute {
    urn: String::new(),
    value: AttributeValue::Null,
    value_created_at: None,
    value_modified_at: None,
};

/// Backend user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| Error::InvalidUserKey(s.to_owned()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute fetched from the identity registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    urn: String,
    #[serde(default)]
    value: AttributeValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_modified_at: Option<String>,
}

impl Attribute {
    pub fn new(urn: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            urn: urn.into(),
            value: value.into(),
            value_created_at: None,
            value_modified_at: None,
        }
    }

    #[must_use]
    pub fn with_timestamps(
        mut self,
        created_at: Option<String>,
        modified_at: Option<String>,
    ) -> Self {
        self.value_created_at = created_at;
        self.value_modified_at = modified_at;
        self
    }

    #[must_use]
    pub fn null() -> &'static Self {
        &NULL_ATTRIBUTE
    }

    #[must_use]
    pub fn urn(&self) -> &str {
        &self.urn
    }

    #[must_use]
    pub const fn value(&self) -> &AttributeValue {
        &self.value
    }

    #[must_use]
    pub fn value_created_at(&self) -> Option<&str> {
        self.value_created_at.as_deref()
    }

    #[must_use]
    pub fn value_modified_at(&self) -> Option<&str> {
        self.value_modified_at.as_deref()
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// Snapshot of one user's attributes, keyed by URN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichUser {
    id: UserId,
    attributes: HashMap<String, Attribute>,
}

impl RichUser {
    pub fn new(id: UserId, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        Self {
            id,
            attributes: attributes
                .into_iter()
                .map(|attr| (attr.urn.clone(), attr))
                .collect(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Attribute by URN, or [`NULL_ATTRIBUTE`] when absent
    #[must_use]
    pub fn attribute(&self, urn: &str) -> &Attribute {
        self.attributes.get(urn).unwrap_or(&NULL_ATTRIBUTE)
    }

    /// Non-null value of an attribute
    #[must_use]
    pub fn attribute_value(&self, urn: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(urn)
            .map(Attribute::value)
            .filter(|value| !value.is_null())
    }

    #[must_use]
    pub fn attribute_text(&self, urn: &str) -> Option<String> {
        self.attribute_value(urn).and_then(AttributeValue::as_text)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = "urn:test:user:attribute-def:def:login";
    const GROUPS: &str = "urn:test:user:attribute-def:virt:groups";

    fn user() -> RichUser {
        RichUser::new(
            UserId::new(42),
            [
                Attribute::new(LOGIN, "alice"),
                Attribute::new(GROUPS, vec!["members", "admins"]),
                Attribute::new("urn:test:empty", AttributeValue::Null),
            ],
        )
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId::new(42));
        assert_eq!("-7".parse::<UserId>().unwrap().get(), -7);
        // one key string maps to one id
        assert!(" 7 ".parse::<UserId>().unwrap_err().is_invalid_user_key());
        assert!("alice".parse::<UserId>().unwrap_err().is_invalid_user_key());
    }

    #[test]
    fn test_absent_attribute_is_null_singleton() {
        let user = user();
        let attr = user.attribute("urn:test:missing");
        assert!(attr.is_null());
        assert!(std::ptr::eq(attr, Attribute::null()));
    }

    #[test]
    fn test_attribute_value_skips_null() {
        let user = user();
        assert!(user.attribute_value("urn:test:empty").is_none());
        assert!(user.attribute_value(LOGIN).is_some());
        assert_eq!(user.len(), 3);
    }

    #[test]
    fn test_attribute_text() {
        let user = user();
        assert_eq!(user.attribute_text(LOGIN).as_deref(), Some("alice"));
        assert_eq!(user.attribute_text(GROUPS).as_deref(), Some("members"));
        assert!(user.attribute_text("urn:test:missing").is_none());
    }

    #[test]
    fn test_attribute_deserialize_camel_case() {
        let attr: Attribute = serde_json::from_str(
            r#"{"urn": "urn:x", "value": ["a"], "valueCreatedAt": "2024-01-01", "valueModifiedAt": "2024-02-01"}"#,
        )
        .unwrap();
        assert_eq!(attr.urn(), "urn:x");
        assert_eq!(attr.value(), &AttributeValue::from(vec!["a"]));
        assert_eq!(attr.value_created_at(), Some("2024-01-01"));
        assert_eq!(attr.value_modified_at(), Some("2024-02-01"));
    }
}
