//! Environment variable loading for configuration

use std::env;
use std::time::Duration;

use super::builder::ConfigBuilder;
use crate::Result;

/// Environment variable names
mod vars {
    pub const USERINFO_CACHE_MAX_ENTRIES: &str = "USERINFO_CACHE_MAX_ENTRIES";
    pub const USERINFO_CACHE_EXPIRY_SECS: &str = "USERINFO_CACHE_EXPIRY_SECS";
    pub const USERINFO_CALL_FALLBACK: &str = "USERINFO_CALL_FALLBACK";
    pub const USERINFO_SUB_ATTRIBUTE: &str = "USERINFO_SUB_ATTRIBUTE";
    pub const USERINFO_CUSTOM_CLAIMS: &str = "USERINFO_CUSTOM_CLAIMS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const USERINFO_JSON_LOGS: &str = "USERINFO_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(max_str) = env::var(vars::USERINFO_CACHE_MAX_ENTRIES) {
        let max = max_str.trim().parse::<usize>().map_err(|e| {
            crate::Error::Config(format!(
                "Invalid {}: {}",
                vars::USERINFO_CACHE_MAX_ENTRIES,
                e
            ))
        })?;
        builder = builder.cache_max_entries(max);
    }

    if let Ok(secs_str) = env::var(vars::USERINFO_CACHE_EXPIRY_SECS) {
        let secs = secs_str.trim().parse::<u64>().map_err(|e| {
            crate::Error::Config(format!(
                "Invalid {}: {}",
                vars::USERINFO_CACHE_EXPIRY_SECS,
                e
            ))
        })?;
        builder = builder.cache_expire_after_access(Duration::from_secs(secs));
    }

    if let Ok(val) = env::var(vars::USERINFO_CALL_FALLBACK) {
        builder = builder.call_fallback(parse_bool(&val));
    }

    if let Ok(urn) = env::var(vars::USERINFO_SUB_ATTRIBUTE) {
        builder = builder.sub_attribute(urn.trim());
    }

    if let Ok(claims) = env::var(vars::USERINFO_CUSTOM_CLAIMS) {
        builder = builder.custom_claims(
            claims
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::USERINFO_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::sync::PoisonError;

    use super::*;
    use crate::config::ENV_MUTEX;

    const ALL_VARS: &[&str] = &[
        vars::USERINFO_CACHE_MAX_ENTRIES,
        vars::USERINFO_CACHE_EXPIRY_SECS,
        vars::USERINFO_CALL_FALLBACK,
        vars::USERINFO_SUB_ATTRIBUTE,
        vars::USERINFO_CUSTOM_CLAIMS,
        vars::RUST_LOG,
        vars::USERINFO_JSON_LOGS,
    ];

    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);

        let old_values: Vec<_> = ALL_VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

        for key in ALL_VARS {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::remove_var(key) };
        }
        for (key, value) in vars {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::set_var(key, value) };
        }

        let result = f();

        for (key, old_value) in old_values {
            match old_value {
                // SAFETY: We hold a mutex lock to ensure no concurrent modifications
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_load_all_vars() {
        with_env_vars(
            &[
                ("USERINFO_CACHE_MAX_ENTRIES", "25"),
                ("USERINFO_CACHE_EXPIRY_SECS", "120"),
                ("USERINFO_CALL_FALLBACK", "yes"),
                ("USERINFO_SUB_ATTRIBUTE", " urn:test:login "),
                ("USERINFO_CUSTOM_CLAIMS", "entitlements, org,,"),
                ("RUST_LOG", "debug"),
                ("USERINFO_JSON_LOGS", "1"),
            ],
            || {
                let config = load_from_env(ConfigBuilder::new())
                    .unwrap()
                    .build()
                    .unwrap();
                assert_eq!(config.cache().max_entries.get(), 25);
                assert_eq!(config.cache().expire_after_access, Duration::from_secs(120));
                assert!(config.call_fallback());
                assert_eq!(config.attributes().sub, "urn:test:login");
                assert_eq!(config.custom_claims(), ["entitlements", "org"]);
                assert_eq!(config.telemetry.log_level, "debug");
                assert!(config.telemetry.json_logs);
            },
        );
    }

    #[test]
    fn test_env_overrides_builder() {
        with_env_vars(&[("USERINFO_CALL_FALLBACK", "false")], || {
            let builder = ConfigBuilder::new()
                .sub_attribute("urn:test:login")
                .call_fallback(true);
            let config = load_from_env(builder).unwrap().build().unwrap();
            assert!(!config.call_fallback());
        });
    }

    #[test]
    fn test_invalid_number() {
        with_env_vars(&[("USERINFO_CACHE_MAX_ENTRIES", "many")], || {
            let err = load_from_env(ConfigBuilder::new()).unwrap_err();
            assert!(err.to_string().contains("USERINFO_CACHE_MAX_ENTRIES"));
        });
    }

    #[test]
    fn test_zero_capacity_fails_build() {
        with_env_vars(
            &[
                ("USERINFO_CACHE_MAX_ENTRIES", "0"),
                ("USERINFO_SUB_ATTRIBUTE", "urn:test:login"),
            ],
            || {
                let builder = load_from_env(ConfigBuilder::new()).unwrap();
                assert!(builder.build().is_err());
            },
        );
    }
}
