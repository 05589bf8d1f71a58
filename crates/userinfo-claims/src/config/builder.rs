//! Configuration builder

use std::num::NonZeroUsize;
use std::time::Duration;

use super::Properties;
use crate::cache::CacheConfig;
use crate::constants::{DEFAULT_CACHE_EXPIRY_SECS, DEFAULT_CACHE_MAX_ENTRIES};
use crate::{Error, Result};

/// Backend attribute URNs the standard claims are read from
///
/// Every mapping except `sub` is optional; an unmapped claim is never
/// produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMappings {
    pub sub: String,
    pub preferred_username: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub middle_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zoneinfo: Option<String>,
    pub locale: Option<String>,
}

/// Backend facade configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub call_fallback: bool,
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub attributes: AttributeMappings,
    pub custom_claims: Vec<String>,
    pub properties: Properties,
    pub cache: CacheConfig,
    pub backend: BackendConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeMappings {
        &self.attributes
    }

    #[must_use]
    pub fn custom_claims(&self) -> &[String] {
        &self.custom_claims
    }

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub const fn call_fallback(&self) -> bool {
        self.backend.call_fallback
    }
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    attributes: AttributeMappings,
    custom_claims: Vec<String>,
    properties: Properties,
    cache_max_entries: usize,
    cache_expire_after_access: Duration,
    backend: BackendConfig,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: AttributeMappings::default(),
            custom_claims: Vec::new(),
            properties: Properties::new(),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_expire_after_access: Duration::from_secs(DEFAULT_CACHE_EXPIRY_SECS),
            backend: BackendConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Replace all attribute mappings
    #[must_use]
    pub fn attributes(mut self, attributes: AttributeMappings) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn sub_attribute(mut self, urn: impl Into<String>) -> Self {
        self.attributes.sub = urn.into();
        self
    }

    /// Update the mappings in place
    #[must_use]
    pub fn map_attributes(mut self, f: impl FnOnce(&mut AttributeMappings)) -> Self {
        f(&mut self.attributes);
        self
    }

    #[must_use]
    pub fn custom_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// Overlay extension properties; later values win
    #[must_use]
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties.merge(properties);
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key, value);
        self
    }

    #[must_use]
    pub const fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = max_entries;
        self
    }

    #[must_use]
    pub const fn cache_expire_after_access(mut self, expiry: Duration) -> Self {
        self.cache_expire_after_access = expiry;
        self
    }

    #[must_use]
    pub const fn call_fallback(mut self, call_fallback: bool) -> Self {
        self.backend.call_fallback = call_fallback;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.telemetry.log_level = level.into();
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.attributes.sub.trim().is_empty() {
            return Err(Error::Config("attribute mapping for sub is required".into()));
        }

        let max_entries = NonZeroUsize::new(self.cache_max_entries)
            .ok_or_else(|| Error::Config("cache max_entries must be greater than 0".into()))?;

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            attributes: self.attributes,
            custom_claims: self.custom_claims,
            properties: self.properties,
            cache: CacheConfig::new()
                .with_max_entries(max_entries)
                .with_expire_after_access(self.cache_expire_after_access),
            backend: self.backend,
            telemetry: TelemetryConfig {
                log_level,
                json_logs: self.telemetry.json_logs,
            },
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_sub() {
        let err = ConfigBuilder::new().build().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("sub"));
    }

    #[test]
    fn test_build_rejects_zero_capacity() {
        let err = ConfigBuilder::new()
            .sub_attribute("urn:test:login")
            .cache_max_entries(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_entries"));
    }

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new()
            .sub_attribute("urn:test:login")
            .build()
            .unwrap();
        assert_eq!(config.attributes().sub, "urn:test:login");
        assert_eq!(config.cache().max_entries.get(), 100);
        assert_eq!(config.cache().expire_after_access, Duration::from_secs(60));
        assert!(!config.call_fallback());
        assert!(config.custom_claims().is_empty());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_fluent_settings() {
        let config = Config::builder()
            .sub_attribute("urn:test:login")
            .map_attributes(|a| a.email = Some("urn:test:mail".into()))
            .custom_claims(["entitlements", "org"])
            .property("custom.claim.org.scope", "organization")
            .cache_max_entries(5)
            .cache_expire_after_access(Duration::from_secs(10))
            .call_fallback(true)
            .log_level("")
            .json_logs(true)
            .build()
            .unwrap();

        assert_eq!(config.attributes().email.as_deref(), Some("urn:test:mail"));
        assert_eq!(config.custom_claims(), ["entitlements", "org"]);
        assert_eq!(
            config.properties().get("custom.claim.org.scope"),
            Some("organization")
        );
        assert_eq!(config.cache().max_entries.get(), 5);
        assert!(config.call_fallback());
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.json_logs);
    }
}
