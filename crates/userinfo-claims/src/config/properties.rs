//! Flat extension properties

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Dotted-key string properties read by claim extensions
///
/// Nested TOML tables are flattened: `[properties.custom.claim.x] scope = "s"`
/// becomes `custom.claim.x.scope = "s"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Overlay another set of properties; entries in `other` win
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten a TOML table into dotted keys
    pub fn from_toml(table: &toml::Table) -> Result<Self> {
        let mut properties = Self::new();
        flatten_into(&mut properties, "", table)?;
        Ok(properties)
    }
}

fn flatten_into(properties: &mut Properties, prefix: &str, table: &toml::Table) -> Result<()> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            toml::Value::Table(nested) => flatten_into(properties, &full_key, nested)?,
            toml::Value::String(s) => properties.insert(full_key, s.clone()),
            toml::Value::Integer(i) => properties.insert(full_key, i.to_string()),
            toml::Value::Float(f) => properties.insert(full_key, f.to_string()),
            toml::Value::Boolean(b) => properties.insert(full_key, b.to_string()),
            toml::Value::Datetime(d) => properties.insert(full_key, d.to_string()),
            toml::Value::Array(_) => {
                return Err(Error::Config(format!(
                    "property {full_key} must be a scalar, found an array"
                )));
            }
        }
    }
    Ok(())
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_default() {
        let props = Properties::new().with("a.b", "1");
        assert_eq!(props.get("a.b"), Some("1"));
        assert_eq!(props.get_or("a.c", "fallback"), "fallback");
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_from_toml_flattens_nested_tables() {
        let table: toml::Table = toml::from_str(
            r#"
            [custom.claim.entitlements]
            scope = "eduperson_entitlement"
            sourceClass = "attribute"

            [custom.claim.count]
            limit = 3
            enabled = true
            "#,
        )
        .unwrap();

        let props = Properties::from_toml(&table).unwrap();
        assert_eq!(
            props.get("custom.claim.entitlements.scope"),
            Some("eduperson_entitlement")
        );
        assert_eq!(
            props.get("custom.claim.entitlements.sourceClass"),
            Some("attribute")
        );
        assert_eq!(props.get("custom.claim.count.limit"), Some("3"));
        assert_eq!(props.get("custom.claim.count.enabled"), Some("true"));
    }

    #[test]
    fn test_from_toml_quoted_dotted_keys() {
        let table: toml::Table =
            toml::from_str(r#""custom.claim.x.scope" = "openid""#).unwrap();
        let props = Properties::from_toml(&table).unwrap();
        assert_eq!(props.get("custom.claim.x.scope"), Some("openid"));
    }

    #[test]
    fn test_from_toml_rejects_arrays() {
        let table: toml::Table = toml::from_str(r#"values = ["a"]"#).unwrap();
        let err = Properties::from_toml(&table).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_merge_overrides() {
        let mut base: Properties = [("k", "base"), ("only", "base")].into_iter().collect();
        base.merge(Properties::new().with("k", "override"));
        assert_eq!(base.get("k"), Some("override"));
        assert_eq!(base.get("only"), Some("base"));
    }
}
