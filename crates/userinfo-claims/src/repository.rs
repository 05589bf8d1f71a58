//! UserInfo repository
//!
//! Owns the claim pipeline and its cache. Built once at startup from a
//! [`Config`], an [`ExtensionRegistry`] and the backend facade.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapter::AdapterFacade;
use crate::cache::{CacheStats, UserInfoCache};
use crate::claims::{ExtensionRegistry, ScopeClaimTranslator};
use crate::config::Config;
use crate::constants::SUB_PROPERTY_PREFIX;
use crate::models::UserInfo;
use crate::pipeline::ClaimPipeline;
use crate::{Error, Result};

/// Cached UserInfo lookups keyed by backend user id
#[derive(Debug, Clone)]
pub struct UserInfoRepository {
    pipeline: Arc<ClaimPipeline>,
    cache: UserInfoCache,
    translator: Arc<ScopeClaimTranslator>,
}

impl UserInfoRepository {
    /// Wire the repository
    ///
    /// Custom claims whose extensions cannot be loaded are logged and left
    /// out; this never fails on plugin configuration.
    pub fn new(config: &Config, registry: &ExtensionRegistry, backend: AdapterFacade) -> Self {
        let properties = config.properties();

        let sub_modifier = registry.load_modifier(properties, SUB_PROPERTY_PREFIX);
        if sub_modifier.is_some() {
            tracing::info!(sub.attribute = %config.attributes().sub, "sub values will be modified");
        }

        let definitions = registry.build_definitions(properties, config.custom_claims());
        tracing::info!(
            custom_claims = definitions.len(),
            configured = config.custom_claims().len(),
            "claim definitions loaded"
        );
        let translator = Arc::new(ScopeClaimTranslator::new(&definitions));

        let pipeline = Arc::new(
            ClaimPipeline::new(
                Arc::new(backend),
                config.attributes().clone(),
                definitions,
            )
            .with_sub_modifier(sub_modifier),
        );
        let cache = UserInfoCache::new(pipeline.clone(), config.cache());

        Self {
            pipeline,
            cache,
            translator,
        }
    }

    /// UserInfo of the user identified by `username`
    ///
    /// `username` is the backend user id in decimal form.
    pub async fn get_by_username(&self, username: &str) -> Result<Arc<UserInfo>> {
        tracing::trace!("get_by_username({username})");
        self.cache
            .get(username)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "cannot get user from cache"))
    }

    /// Lookup by e-mail address is not supported by the backend
    #[allow(clippy::unused_async)]
    pub async fn get_by_email(&self, email: &str) -> Result<Arc<UserInfo>> {
        tracing::trace!("get_by_email({email})");
        Err(Error::Unsupported("lookup by email address"))
    }

    /// UserInfo JSON restricted to the claims released by `scopes`
    pub async fn get_for_scopes<S: AsRef<str> + Sync>(
        &self,
        username: &str,
        scopes: &[S],
    ) -> Result<Map<String, Value>> {
        let info = self.get_by_username(username).await?;
        Ok(self.translator.filter(&info, scopes))
    }

    #[must_use]
    pub fn cache(&self) -> &UserInfoCache {
        &self.cache
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[must_use]
    pub fn pipeline(&self) -> &ClaimPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn scope_translator(&self) -> &ScopeClaimTranslator {
        &self.translator
    }
}
