//! Primary/fallback adapter facade

use std::sync::Arc;

use async_trait::async_trait;

use super::{AdapterError, AdapterResult, BackendAdapter};
use crate::models::{Attribute, RichUser, UserId};

/// Failover facade over a primary and an optional fallback adapter
///
/// The fallback is consulted only when the primary fails, `call_fallback`
/// is set and a fallback adapter is configured. Results are never merged.
#[derive(Debug, Clone)]
pub struct AdapterFacade {
    primary: Arc<dyn BackendAdapter>,
    fallback: Option<Arc<dyn BackendAdapter>>,
    call_fallback: bool,
}

impl AdapterFacade {
    pub fn new(primary: Arc<dyn BackendAdapter>) -> Self {
        Self {
            primary,
            fallback: None,
            call_fallback: false,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn BackendAdapter>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[must_use]
    pub const fn with_call_fallback(mut self, call_fallback: bool) -> Self {
        self.call_fallback = call_fallback;
        self
    }

    #[must_use]
    pub const fn calls_fallback(&self) -> bool {
        self.call_fallback
    }

    #[must_use]
    pub const fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn active_fallback(&self, operation: &str, err: &AdapterError) -> Option<&dyn BackendAdapter> {
        let fallback = self.fallback.as_deref().filter(|_| self.call_fallback)?;
        tracing::warn!(
            backend.operation = operation,
            backend.primary = self.primary.name(),
            backend.fallback = fallback.name(),
            error = %err,
            "primary backend failed, calling fallback"
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_backend_failover(operation);
        Some(fallback)
    }
}

#[async_trait]
impl BackendAdapter for AdapterFacade {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn get_user_attributes(&self, user_id: UserId) -> AdapterResult<RichUser> {
        match self.primary.get_user_attributes(user_id).await {
            Ok(user) => Ok(user),
            Err(err) => match self.active_fallback("get_user_attributes", &err) {
                Some(fallback) => fallback.get_user_attributes(user_id).await.inspect_err(|e| {
                    tracing::error!(user_id = %user_id, error = %e, "fallback backend failed");
                }),
                None => Err(err),
            },
        }
    }

    async fn get_user_attribute(&self, user_id: UserId, urn: &str) -> AdapterResult<Attribute> {
        match self.primary.get_user_attribute(user_id, urn).await {
            Ok(attribute) => Ok(attribute),
            Err(err) => match self.active_fallback("get_user_attribute", &err) {
                Some(fallback) => fallback
                    .get_user_attribute(user_id, urn)
                    .await
                    .inspect_err(|e| {
                        tracing::error!(
                            user_id = %user_id,
                            attribute = urn,
                            error = %e,
                            "fallback backend failed"
                        );
                    }),
                None => Err(err),
            },
        }
    }
}
