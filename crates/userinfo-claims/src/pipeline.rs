//! UserInfo production from backend attributes

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::adapter::{AdapterFacade, BackendAdapter};
use crate::cache::UserInfoLoader;
use crate::claims::{ClaimDefinition, ClaimModifier, ProduceContext, apply_modifier};
use crate::config::AttributeMappings;
use crate::models::{RichUser, UserId, UserInfo, UserInfoBuilder};
use crate::{Error, Result};

/// Builds a [`UserInfo`] from one backend fetch
///
/// Failing to resolve the user id, fetch the user or compute `sub` aborts the
/// production. Custom claims fail in isolation: a claim whose source errors
/// yields nothing or panics is left out.
#[derive(Debug)]
pub struct ClaimPipeline {
    backend: Arc<AdapterFacade>,
    attributes: AttributeMappings,
    sub_modifier: Option<Box<dyn ClaimModifier>>,
    definitions: Vec<ClaimDefinition>,
}

impl ClaimPipeline {
    pub fn new(
        backend: Arc<AdapterFacade>,
        attributes: AttributeMappings,
        definitions: Vec<ClaimDefinition>,
    ) -> Self {
        Self {
            backend,
            attributes,
            sub_modifier: None,
            definitions,
        }
    }

    #[must_use]
    pub fn with_sub_modifier(mut self, modifier: Option<Box<dyn ClaimModifier>>) -> Self {
        self.sub_modifier = modifier;
        self
    }

    #[must_use]
    pub fn definitions(&self) -> &[ClaimDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn backend(&self) -> &AdapterFacade {
        &self.backend
    }

    /// Produce the UserInfo of `user_key`
    pub async fn produce(&self, user_key: &str) -> Result<UserInfo> {
        tracing::trace!("load({user_key})");
        let user_id: UserId = user_key.parse()?;
        let rich_user = self.backend.get_user_attributes(user_id).await?;

        let sub = self.subject(&rich_user, user_key)?;
        let mut builder = self.standard_claims(UserInfo::builder(user_id, sub.as_str()), &rich_user);

        let ctx = ProduceContext::new(user_id, &sub, &rich_user, &self.backend);
        tracing::trace!("processing custom claims");
        for definition in &self.definitions {
            if let Some(value) = Self::produce_claim(definition, &ctx).await {
                builder = builder.custom_claim(definition.claim(), value);
            }
        }

        tracing::trace!("user loaded");
        Ok(builder.build())
    }

    fn subject(&self, rich_user: &RichUser, user_key: &str) -> Result<String> {
        let missing = || Error::MissingSubject {
            attribute: self.attributes.sub.clone(),
            user_key: user_key.to_owned(),
        };

        let sub = rich_user
            .attribute_text(&self.attributes.sub)
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;

        match &self.sub_modifier {
            Some(modifier) => {
                let modified = modifier.modify(&sub);
                tracing::debug!("modified sub '{sub}' to '{modified}'");
                if modified.is_empty() { Err(missing()) } else { Ok(modified) }
            }
            None => Ok(sub),
        }
    }

    fn standard_claims(&self, builder: UserInfoBuilder, rich_user: &RichUser) -> UserInfoBuilder {
        let text = |urn: &Option<String>| urn.as_deref().and_then(|u| rich_user.attribute_text(u));
        let attrs = &self.attributes;

        builder
            .preferred_username(text(&attrs.preferred_username))
            .given_name(text(&attrs.given_name))
            .family_name(text(&attrs.family_name))
            .middle_name(text(&attrs.middle_name))
            .name(text(&attrs.full_name))
            .email(text(&attrs.email))
            .zoneinfo(text(&attrs.zoneinfo))
            .locale(text(&attrs.locale))
            .phone_number(text(&attrs.phone))
            .address(text(&attrs.address))
    }

    async fn produce_claim(
        definition: &ClaimDefinition,
        ctx: &ProduceContext<'_>,
    ) -> Option<serde_json::Value> {
        let claim = definition.claim();
        tracing::trace!("producing value for claim {claim}");

        let produced = AssertUnwindSafe(definition.source().produce_value(ctx))
            .catch_unwind()
            .await;
        let value = match produced {
            Ok(Ok(Some(value))) if !value.is_null() => value,
            Ok(Ok(_)) => {
                tracing::warn!("claim {claim} is null");
                return None;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "claim {claim} could not be produced");
                return None;
            }
            Err(_) => {
                tracing::warn!("claim source of {claim} panicked");
                return None;
            }
        };
        tracing::trace!("produced value {value}");

        Some(match definition.modifier() {
            Some(modifier) => {
                tracing::debug!("modifying values of claim '{claim}' using {modifier:?}");
                apply_modifier(value, modifier)
            }
            None => value,
        })
    }
}

#[async_trait]
impl UserInfoLoader for ClaimPipeline {
    async fn load(&self, user_key: &str) -> Result<UserInfo> {
        self.produce(user_key).await
    }
}
