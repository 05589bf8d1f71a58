//! Name to factory table for claim extensions

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::{
    AppendModifier, AttributeClaimSource, ClaimDefinition, ClaimModifier, ClaimSource,
    FetchedAttributeClaimSource, InitContext, MergedArraysClaimSource, RegexReplaceModifier,
    StaticValueClaimSource,
};
use crate::Result;
use crate::config::Properties;
use crate::constants::{
    DEFAULT_SOURCE, MODIFIER_CLASS_SUFFIX, SCOPE_SUFFIX, SOURCE_CLASS_SUFFIX, custom_claim_prefix,
};

/// Constructs a claim source from its init context
pub type SourceFactory = fn(&InitContext<'_>) -> Result<Box<dyn ClaimSource>>;

/// Constructs a claim modifier from its init context
pub type ModifierFactory = fn(&InitContext<'_>) -> Result<Box<dyn ClaimModifier>>;

static BUILTIN: LazyLock<ExtensionRegistry> = LazyLock::new(ExtensionRegistry::with_builtins);

/// Registered claim sources and modifiers
///
/// Populated once at startup; [`build_definitions`](Self::build_definitions)
/// turns the configured claim names into [`ClaimDefinition`]s. Loading never
/// fails hard: a claim whose extension cannot be resolved is logged and
/// skipped.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    sources: HashMap<String, SourceFactory>,
    modifiers: HashMap<String, ModifierFactory>,
}

impl ExtensionRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry holding only the built-in extensions
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Registry pre-populated with the built-in extensions
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new()
            .with_source("attribute", attribute_source)
            .with_source("fetched-attribute", fetched_attribute_source)
            .with_source("static", static_source)
            .with_source("merged-arrays", merged_arrays_source)
            .with_modifier("regex-replace", regex_replace_modifier)
            .with_modifier("append", append_modifier)
    }

    pub fn register_source(&mut self, name: impl Into<String>, factory: SourceFactory) {
        self.sources.insert(name.into(), factory);
    }

    pub fn register_modifier(&mut self, name: impl Into<String>, factory: ModifierFactory) {
        self.modifiers.insert(name.into(), factory);
    }

    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, factory: SourceFactory) -> Self {
        self.register_source(name, factory);
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, name: impl Into<String>, factory: ModifierFactory) -> Self {
        self.register_modifier(name, factory);
        self
    }

    #[must_use]
    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    #[must_use]
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    /// Sorted names of registered sources and modifiers
    #[must_use]
    pub fn names(&self) -> (Vec<&str>, Vec<&str>) {
        let mut sources: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        let mut modifiers: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        sources.sort_unstable();
        modifiers.sort_unstable();
        (sources, modifiers)
    }

    /// Load the claim source configured under `prefix`
    ///
    /// Falls back to the `attribute` source when `<prefix>.sourceClass` is
    /// not set. Returns `None` (after logging) when the name is unknown,
    /// names a modifier, or the constructor fails.
    pub fn load_source(
        &self,
        properties: &Properties,
        prefix: &str,
    ) -> Option<Box<dyn ClaimSource>> {
        let key = format!("{prefix}.{SOURCE_CLASS_SUFFIX}");
        let name = properties.get_or(&key, DEFAULT_SOURCE);

        let Some(factory) = self.sources.get(name) else {
            if self.modifiers.contains_key(name) {
                tracing::error!("{key}={name} does not implement ClaimSource");
            } else {
                tracing::error!("{key}={name} not found");
            }
            return None;
        };

        match factory(&InitContext::new(prefix, properties)) {
            Ok(source) => {
                tracing::info!("loaded claim source {name} for {prefix}");
                Some(source)
            }
            Err(e) => {
                tracing::error!("{key}={name} cannot be instantiated: {e}");
                None
            }
        }
    }

    /// Load the claim modifier configured under `prefix`, if any
    pub fn load_modifier(
        &self,
        properties: &Properties,
        prefix: &str,
    ) -> Option<Box<dyn ClaimModifier>> {
        let key = format!("{prefix}.{MODIFIER_CLASS_SUFFIX}");
        let Some(name) = properties.get(&key) else {
            tracing::debug!("no {key} configured");
            return None;
        };

        let Some(factory) = self.modifiers.get(name) else {
            if self.sources.contains_key(name) {
                tracing::error!("{key}={name} does not implement ClaimModifier");
            } else {
                tracing::error!("{key}={name} not found");
            }
            return None;
        };

        match factory(&InitContext::new(prefix, properties)) {
            Ok(modifier) => {
                tracing::info!("loaded claim modifier {name} for {prefix}");
                Some(modifier)
            }
            Err(e) => {
                tracing::error!("{key}={name} cannot be instantiated: {e}");
                None
            }
        }
    }

    /// Build claim definitions for `claim_names`, in the given order
    ///
    /// Claims without a scope or without a loadable source are skipped.
    pub fn build_definitions<S: AsRef<str>>(
        &self,
        properties: &Properties,
        claim_names: &[S],
    ) -> Vec<ClaimDefinition> {
        let mut definitions = Vec::with_capacity(claim_names.len());
        for claim in claim_names {
            let claim = claim.as_ref();
            let prefix = custom_claim_prefix(claim);

            let Some(scope) = properties.get(&format!("{prefix}.{SCOPE_SUFFIX}")) else {
                tracing::error!("property {prefix}.{SCOPE_SUFFIX} not found, skipping claim {claim}");
                continue;
            };
            let Some(source) = self.load_source(properties, &prefix) else {
                continue;
            };
            let modifier = self.load_modifier(properties, &prefix);

            tracing::debug!(claim, scope, has_modifier = modifier.is_some(), "claim defined");
            definitions.push(ClaimDefinition::new(scope, claim, source, modifier));
        }
        definitions
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sources, modifiers) = self.names();
        f.debug_struct("ExtensionRegistry")
            .field("sources", &sources)
            .field("modifiers", &modifiers)
            .finish()
    }
}

fn attribute_source(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimSource>> {
    Ok(Box::new(AttributeClaimSource::new(ctx)?))
}

fn fetched_attribute_source(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimSource>> {
    Ok(Box::new(FetchedAttributeClaimSource::new(ctx)?))
}

fn static_source(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimSource>> {
    Ok(Box::new(StaticValueClaimSource::new(ctx)?))
}

fn merged_arrays_source(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimSource>> {
    Ok(Box::new(MergedArraysClaimSource::new(ctx)?))
}

fn regex_replace_modifier(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimModifier>> {
    Ok(Box::new(RegexReplaceModifier::new(ctx)?))
}

fn append_modifier(ctx: &InitContext<'_>) -> Result<Box<dyn ClaimModifier>> {
    Ok(Box::new(AppendModifier::new(ctx)?))
}
