//! OpenID Connect UserInfo claims over an identity registry backend
//!
//! Fetches a user's attributes through a failover [`AdapterFacade`], maps
//! them onto standard claims, adds custom claims produced by pluggable
//! claim sources and serves the result from a single-flight LRU cache.

pub mod adapter;
pub mod cache;
pub mod claims;
pub mod config;
mod constants;
mod error;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod repository;

pub use adapter::{AdapterError, AdapterFacade, AdapterResult, BackendAdapter, StaticAdapter};
pub use cache::{CacheConfig, CacheStats, UserInfoCache, UserInfoLoader};
pub use claims::{
    ClaimDefinition, ClaimModifier, ClaimModifierInitContext, ClaimSource,
    ClaimSourceInitContext, ClaimSourceProduceContext, ExtensionRegistry, ScopeClaimTranslator,
};
pub use config::{AttributeMappings, Config, ConfigBuilder, Properties, TelemetryConfig};
pub use constants::{CUSTOM_CLAIM_PREFIX, SUB_PROPERTY_PREFIX, custom_claim_prefix};
pub use error::{Error, Result};
pub use models::{Attribute, AttributeValue, RichUser, UserId, UserInfo};
pub use pipeline::ClaimPipeline;
pub use repository::UserInfoRepository;
