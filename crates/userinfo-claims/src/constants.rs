//! Constants for claim configuration and caching

/// Property prefix of a custom claim (`custom.claim.<name>`)
pub const CUSTOM_CLAIM_PREFIX: &str = "custom.claim";

/// Property prefix used to look up the modifier applied to `sub`
pub const SUB_PROPERTY_PREFIX: &str = "attribute.openid.sub";

/// Property suffix holding the scope a custom claim is released under
pub const SCOPE_SUFFIX: &str = "scope";

/// Property suffix naming the claim source implementation
pub const SOURCE_CLASS_SUFFIX: &str = "sourceClass";

/// Property suffix naming the claim modifier implementation
pub const MODIFIER_CLASS_SUFFIX: &str = "modifierClass";

/// Claim source used when `<prefix>.sourceClass` is not configured
pub const DEFAULT_SOURCE: &str = "attribute";

/// Default maximum number of cached UserInfo records
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;

/// Default idle expiry of a cached UserInfo record, in seconds
pub const DEFAULT_CACHE_EXPIRY_SECS: u64 = 60;

/// Build the property prefix of a custom claim
#[must_use]
pub fn custom_claim_prefix(claim: &str) -> String {
    format!("{CUSTOM_CLAIM_PREFIX}.{claim}")
}
