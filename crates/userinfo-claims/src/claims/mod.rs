//! Custom claim extensions
//!
//! Custom claims are produced by pluggable [`ClaimSource`]s and optionally
//! rewritten by [`ClaimModifier`]s. Implementations are looked up by name in
//! an [`ExtensionRegistry`] when the definitions are built at startup.
//!
//! # Built-in Sources
//!
//! - `attribute` - [`AttributeClaimSource`], passes a rich user attribute through
//! - `fetched-attribute` - [`FetchedAttributeClaimSource`], fetches one attribute from the backend
//! - `static` - [`StaticValueClaimSource`], constant value
//! - `merged-arrays` - [`MergedArraysClaimSource`], union of two list attributes
//!
//! # Built-in Modifiers
//!
//! - `regex-replace` - [`RegexReplaceModifier`]
//! - `append` - [`AppendModifier`]

mod modifiers;
mod registry;
mod scope;
mod sources;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use modifiers::{AppendModifier, RegexReplaceModifier};
pub use registry::{ExtensionRegistry, ModifierFactory, SourceFactory};
pub use scope::ScopeClaimTranslator;
pub use sources::{
    AttributeClaimSource, FetchedAttributeClaimSource, MergedArraysClaimSource,
    StaticValueClaimSource,
};

use crate::adapter::AdapterFacade;
use crate::config::Properties;
use crate::models::{RichUser, UserId};
use crate::{Error, Result};

/// Produces the JSON value of one custom claim
#[async_trait]
pub trait ClaimSource: Send + Sync + fmt::Debug {
    /// `Ok(None)` when the user has no value for the claim
    async fn produce_value(&self, ctx: &ProduceContext<'_>) -> Result<Option<Value>>;
}

/// Rewrites string claim values
pub trait ClaimModifier: Send + Sync + fmt::Debug {
    fn modify(&self, value: &str) -> String;
}

/// Construction context handed to an extension factory
#[derive(Debug, Clone, Copy)]
pub struct InitContext<'a> {
    property_prefix: &'a str,
    properties: &'a Properties,
}

pub type ClaimSourceInitContext<'a> = InitContext<'a>;
pub type ClaimModifierInitContext<'a> = InitContext<'a>;

impl<'a> InitContext<'a> {
    #[must_use]
    pub const fn new(property_prefix: &'a str, properties: &'a Properties) -> Self {
        Self {
            property_prefix,
            properties,
        }
    }

    #[must_use]
    pub const fn property_prefix(&self) -> &'a str {
        self.property_prefix
    }

    /// Property `<prefix>.<suffix>`
    #[must_use]
    pub fn property(&self, suffix: &str) -> Option<&'a str> {
        self.properties
            .get(&format!("{}.{suffix}", self.property_prefix))
    }

    #[must_use]
    pub fn property_or(&self, suffix: &str, default: &'a str) -> &'a str {
        self.property(suffix).unwrap_or(default)
    }

    pub fn required_property(&self, suffix: &str) -> Result<&'a str> {
        self.property(suffix).ok_or_else(|| {
            Error::Plugin(format!(
                "missing property {}.{suffix}",
                self.property_prefix
            ))
        })
    }
}

/// Per-production context handed to claim sources
#[derive(Debug, Clone, Copy)]
pub struct ProduceContext<'a> {
    user_id: UserId,
    sub: &'a str,
    rich_user: &'a RichUser,
    backend: &'a AdapterFacade,
}

pub type ClaimSourceProduceContext<'a> = ProduceContext<'a>;

impl<'a> ProduceContext<'a> {
    #[must_use]
    pub const fn new(
        user_id: UserId,
        sub: &'a str,
        rich_user: &'a RichUser,
        backend: &'a AdapterFacade,
    ) -> Self {
        Self {
            user_id,
            sub,
            rich_user,
            backend,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub const fn sub(&self) -> &'a str {
        self.sub
    }

    #[must_use]
    pub const fn rich_user(&self) -> &'a RichUser {
        self.rich_user
    }

    #[must_use]
    pub const fn backend(&self) -> &'a AdapterFacade {
        self.backend
    }
}

/// One configured custom claim
#[derive(Debug)]
pub struct ClaimDefinition {
    scope: String,
    claim: String,
    source: Box<dyn ClaimSource>,
    modifier: Option<Box<dyn ClaimModifier>>,
}

impl ClaimDefinition {
    pub fn new(
        scope: impl Into<String>,
        claim: impl Into<String>,
        source: Box<dyn ClaimSource>,
        modifier: Option<Box<dyn ClaimModifier>>,
    ) -> Self {
        Self {
            scope: scope.into(),
            claim: claim.into(),
            source,
            modifier,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn claim(&self) -> &str {
        &self.claim
    }

    #[must_use]
    pub fn source(&self) -> &dyn ClaimSource {
        &*self.source
    }

    #[must_use]
    pub fn modifier(&self) -> Option<&dyn ClaimModifier> {
        self.modifier.as_deref()
    }
}

/// Apply a modifier to a produced claim value.
///
/// Strings are rewritten, lists have each string element rewritten, every
/// other shape is returned unchanged.
#[must_use]
pub fn apply_modifier(value: Value, modifier: &dyn ClaimModifier) -> Value {
    match value {
        Value::String(s) => Value::String(modifier.modify(&s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(original) => {
                        let modified = modifier.modify(&original);
                        tracing::debug!("transforming value '{original}' to '{modified}'");
                        Value::String(modified)
                    }
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}
