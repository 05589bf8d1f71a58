//! Built-in claim modifiers

use regex::Regex;

use super::{ClaimModifier, ClaimModifierInitContext};
use crate::{Error, Result};

/// Regex find/replace over every match
///
/// Properties: `<prefix>.find` (required), `<prefix>.replace` (default empty).
/// The replacement supports `$1` / `${name}` group references.
#[derive(Debug, Clone)]
pub struct RegexReplaceModifier {
    find: Regex,
    replace: String,
}

impl RegexReplaceModifier {
    pub fn new(ctx: &ClaimModifierInitContext<'_>) -> Result<Self> {
        let pattern = ctx.required_property("find")?;
        let find = Regex::new(pattern).map_err(|e| {
            Error::Plugin(format!(
                "{}.find is not a valid regex: {e}",
                ctx.property_prefix()
            ))
        })?;
        let replace = ctx.property_or("replace", "").to_owned();
        tracing::debug!(
            "{} - find '{pattern}' replace '{replace}'",
            ctx.property_prefix()
        );
        Ok(Self { find, replace })
    }
}

impl ClaimModifier for RegexReplaceModifier {
    fn modify(&self, value: &str) -> String {
        self.find
            .replace_all(value, self.replace.as_str())
            .into_owned()
    }
}

/// Appends a fixed suffix
///
/// Properties: `<prefix>.appendString` (required).
#[derive(Debug, Clone)]
pub struct AppendModifier {
    suffix: String,
}

impl AppendModifier {
    pub fn new(ctx: &ClaimModifierInitContext<'_>) -> Result<Self> {
        Ok(Self {
            suffix: ctx.required_property("appendString")?.to_owned(),
        })
    }
}

impl ClaimModifier for AppendModifier {
    fn modify(&self, value: &str) -> String {
        format!("{value}{}", self.suffix)
    }
}
