//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::Properties;
use super::builder::{AttributeMappings, ConfigBuilder};
use crate::Result;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./userinfo-claims.toml",
    "~/.config/userinfo-claims/config.toml",
    "/etc/userinfo-claims/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

/// Apply TOML configuration text to a builder
pub fn load_from_str(content: &str, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let file_config: FileConfig = toml::from_str(content)
        .map_err(|e| crate::Error::Config(format!("Failed to parse configuration: {e}")))?;
    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(attrs) = config.attributes {
        builder = builder.map_attributes(|mapping| attrs.apply(mapping));
    }

    if let Some(claims) = config.claims
        && let Some(custom) = claims.custom
    {
        builder = builder.custom_claims(custom);
    }

    if let Some(table) = config.properties {
        builder = builder.properties(Properties::from_toml(&table)?);
    }

    if let Some(cache) = config.cache {
        if let Some(max) = cache.max_entries {
            builder = builder.cache_max_entries(max);
        }

        if let Some(secs) = cache.expire_after_access_secs {
            builder = builder.cache_expire_after_access(Duration::from_secs(secs));
        }
    }

    if let Some(backend) = config.backend
        && let Some(call_fallback) = backend.call_fallback
    {
        builder = builder.call_fallback(call_fallback);
    }

    if let Some(telemetry) = config.telemetry {
        if let Some(level) = telemetry.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = telemetry.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    attributes: Option<AttributesFileConfig>,
    claims: Option<ClaimsFileConfig>,
    properties: Option<toml::Table>,
    cache: Option<CacheFileConfig>,
    backend: Option<BackendFileConfig>,
    telemetry: Option<TelemetryFileConfig>,
}

#[derive(Debug, Deserialize)]
struct AttributesFileConfig {
    sub: Option<String>,
    preferred_username: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    middle_name: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    zoneinfo: Option<String>,
    locale: Option<String>,
}

impl AttributesFileConfig {
    fn apply(self, mapping: &mut AttributeMappings) {
        if let Some(sub) = self.sub {
            mapping.sub = sub;
        }
        let optional = [
            (&mut mapping.preferred_username, self.preferred_username),
            (&mut mapping.given_name, self.given_name),
            (&mut mapping.family_name, self.family_name),
            (&mut mapping.middle_name, self.middle_name),
            (&mut mapping.full_name, self.full_name),
            (&mut mapping.email, self.email),
            (&mut mapping.address, self.address),
            (&mut mapping.phone, self.phone),
            (&mut mapping.zoneinfo, self.zoneinfo),
            (&mut mapping.locale, self.locale),
        ];
        for (slot, value) in optional {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsFileConfig {
    custom: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CacheFileConfig {
    max_entries: Option<usize>,
    expire_after_access_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BackendFileConfig {
    call_fallback: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TelemetryFileConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}
