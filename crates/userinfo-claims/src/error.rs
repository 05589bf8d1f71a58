use thiserror::Error;

use crate::adapter::AdapterError;

/// Errors surfaced by UserInfo production and startup wiring.
///
/// `Clone` so a single failed production can be handed to every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(#[from] AdapterError),

    #[error("Invalid user key '{0}': expected a numeric backend identifier")]
    InvalidUserKey(String),

    #[error("Cannot get sub from attribute {attribute} for user {user_key}")]
    MissingSubject { attribute: String, user_key: String },

    /// A claim source could not produce its value
    ///
    /// Returned by [`ClaimSource`](crate::claims::ClaimSource) implementations,
    /// including third-party ones. The pipeline omits the affected claim.
    #[error("Claim source error: {0}")]
    ClaimSource(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    #[must_use]
    pub const fn is_missing_subject(&self) -> bool {
        matches!(self, Self::MissingSubject { .. })
    }

    #[must_use]
    pub const fn is_invalid_user_key(&self) -> bool {
        matches!(self, Self::InvalidUserKey(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
