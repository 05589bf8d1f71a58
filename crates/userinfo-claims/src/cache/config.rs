//! Cache configuration types

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::constants::{DEFAULT_CACHE_EXPIRY_SECS, DEFAULT_CACHE_MAX_ENTRIES};

const DEFAULT_MAX_ENTRIES: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CACHE_MAX_ENTRIES) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// UserInfo cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached records; least recently used beyond this
    pub max_entries: NonZeroUsize,
    /// Idle time after which a record is treated as absent
    pub expire_after_access: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            expire_after_access: Duration::from_secs(DEFAULT_CACHE_EXPIRY_SECS),
        }
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: NonZeroUsize) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub const fn with_expire_after_access(mut self, expire_after_access: Duration) -> Self {
        self.expire_after_access = expire_after_access;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries.get(), 100);
        assert_eq!(config.expire_after_access, Duration::from_secs(60));
    }

    #[test]
    fn test_builders() {
        let config = CacheConfig::new()
            .with_max_entries(NonZeroUsize::new(5).unwrap())
            .with_expire_after_access(Duration::from_millis(250));
        assert_eq!(config.max_entries.get(), 5);
        assert_eq!(config.expire_after_access, Duration::from_millis(250));
    }
}
