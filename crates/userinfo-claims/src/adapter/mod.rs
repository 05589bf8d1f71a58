//! Backend adapter abstraction
//!
//! The identity registry is reached through [`BackendAdapter`] implementations.
//! Transports (RPC, directory mirrors) live outside this crate; the
//! [`AdapterFacade`] composes a primary and an optional fallback adapter
//! behind the same trait.
//!
//! # Available Adapters
//!
//! - [`AdapterFacade`] - Failover over two adapters
//! - [`StaticAdapter`] - Fixture-backed adapter serving snapshots from JSON

mod facade;
mod fixture;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use facade::AdapterFacade;
pub use fixture::StaticAdapter;

use crate::models::{Attribute, RichUser, UserId};

/// Backend adapter failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend timeout after {0:?}")]
    Timeout(Duration),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("User {0} not found in backend")]
    UserNotFound(UserId),
}

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Attribute-fetch capability of an identity registry backend
#[async_trait]
pub trait BackendAdapter: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch all attributes of a user
    async fn get_user_attributes(&self, user_id: UserId) -> AdapterResult<RichUser>;

    /// Fetch a single attribute; the null attribute when the user has no value
    async fn get_user_attribute(&self, user_id: UserId, urn: &str) -> AdapterResult<Attribute> {
        let user = self.get_user_attributes(user_id).await?;
        Ok(user.attribute(urn).clone())
    }
}
