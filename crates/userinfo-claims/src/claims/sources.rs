//! Built-in claim sources

use async_trait::async_trait;
use serde_json::Value;

use super::{ClaimSource, ClaimSourceInitContext, ProduceContext};
use crate::{Error, Result};
use crate::adapter::BackendAdapter;
use crate::models::AttributeValue;

/// Passes one rich user attribute through as the claim value
///
/// Properties: `<prefix>.attribute` (required).
#[derive(Debug, Clone)]
pub struct AttributeClaimSource {
    attribute: String,
}

impl AttributeClaimSource {
    pub fn new(ctx: &ClaimSourceInitContext<'_>) -> Result<Self> {
        let attribute = ctx.required_property("attribute")?.to_owned();
        tracing::debug!(
            "{} - attribute name {attribute}",
            ctx.property_prefix()
        );
        Ok(Self { attribute })
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

#[async_trait]
impl ClaimSource for AttributeClaimSource {
    async fn produce_value(&self, ctx: &ProduceContext<'_>) -> Result<Option<Value>> {
        Ok(ctx
            .rich_user()
            .attribute_value(&self.attribute)
            .map(AttributeValue::to_json))
    }
}

/// Fetches one attribute through the backend at production time
///
/// Used for attributes the registry does not include in the rich user
/// snapshot. Properties: `<prefix>.attribute` (required).
#[derive(Debug, Clone)]
pub struct FetchedAttributeClaimSource {
    attribute: String,
}

impl FetchedAttributeClaimSource {
    pub fn new(ctx: &ClaimSourceInitContext<'_>) -> Result<Self> {
        Ok(Self {
            attribute: ctx.required_property("attribute")?.to_owned(),
        })
    }
}

#[async_trait]
impl ClaimSource for FetchedAttributeClaimSource {
    async fn produce_value(&self, ctx: &ProduceContext<'_>) -> Result<Option<Value>> {
        let attribute = ctx
            .backend()
            .get_user_attribute(ctx.user_id(), &self.attribute)
            .await
            .map_err(|e| Error::ClaimSource(format!("cannot fetch {}: {e}", self.attribute)))?;
        Ok((!attribute.is_null()).then(|| attribute.value().to_json()))
    }
}

/// Constant claim value
///
/// Properties: `<prefix>.value` (required).
#[derive(Debug, Clone)]
pub struct StaticValueClaimSource {
    value: String,
}

impl StaticValueClaimSource {
    pub fn new(ctx: &ClaimSourceInitContext<'_>) -> Result<Self> {
        Ok(Self {
            value: ctx.required_property("value")?.to_owned(),
        })
    }
}

#[async_trait]
impl ClaimSource for StaticValueClaimSource {
    async fn produce_value(&self, _ctx: &ProduceContext<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::String(self.value.clone())))
    }
}

/// Union of two list attributes, first-seen order, without duplicates
///
/// Properties: `<prefix>.attribute1` and `<prefix>.attribute2` (required).
/// A string attribute counts as a single-element list.
#[derive(Debug, Clone)]
pub struct MergedArraysClaimSource {
    first: String,
    second: String,
}

impl MergedArraysClaimSource {
    pub fn new(ctx: &ClaimSourceInitContext<'_>) -> Result<Self> {
        Ok(Self {
            first: ctx.required_property("attribute1")?.to_owned(),
            second: ctx.required_property("attribute2")?.to_owned(),
        })
    }
}

#[async_trait]
impl ClaimSource for MergedArraysClaimSource {
    async fn produce_value(&self, ctx: &ProduceContext<'_>) -> Result<Option<Value>> {
        let user = ctx.rich_user();
        let values: Vec<&AttributeValue> = [&self.first, &self.second]
            .into_iter()
            .filter_map(|urn| user.attribute_value(urn))
            .collect();
        if values.is_empty() {
            return Ok(None);
        }

        let mut merged: Vec<Value> = Vec::new();
        for value in values {
            let items = match value {
                AttributeValue::List(items) => items.iter().map(AttributeValue::to_json).collect(),
                other => vec![other.to_json()],
            };
            for item in items {
                if !merged.contains(&item) {
                    merged.push(item);
                }
            }
        }
        Ok(Some(Value::Array(merged)))
    }
}
