//! Scope to claim release rules

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use super::ClaimDefinition;
use crate::models::UserInfo;

const OPENID_CLAIMS: &[&str] = &["sub"];
const PROFILE_CLAIMS: &[&str] = &[
    "name",
    "preferred_username",
    "given_name",
    "family_name",
    "middle_name",
    "zoneinfo",
    "locale",
];
const EMAIL_CLAIMS: &[&str] = &["email"];
const ADDRESS_CLAIMS: &[&str] = &["address"];
const PHONE_CLAIMS: &[&str] = &["phone_number"];

fn standard_claims(scope: &str) -> &'static [&'static str] {
    match scope {
        "openid" => OPENID_CLAIMS,
        "profile" => PROFILE_CLAIMS,
        "email" => EMAIL_CLAIMS,
        "address" => ADDRESS_CLAIMS,
        "phone" => PHONE_CLAIMS,
        _ => &[],
    }
}

/// Maps granted scopes to the claims they release
///
/// Standard OIDC scopes release their standard claims; each custom claim is
/// released by the scope it was configured with. `sub` is always released.
#[derive(Debug, Clone, Default)]
pub struct ScopeClaimTranslator {
    custom: HashMap<String, Vec<String>>,
}

impl ScopeClaimTranslator {
    #[must_use]
    pub fn new(definitions: &[ClaimDefinition]) -> Self {
        let mut custom: HashMap<String, Vec<String>> = HashMap::new();
        for definition in definitions {
            custom
                .entry(definition.scope().to_owned())
                .or_default()
                .push(definition.claim().to_owned());
        }
        Self { custom }
    }

    /// Claim names released by `scopes`
    pub fn claims_for<S: AsRef<str>>(&self, scopes: &[S]) -> BTreeSet<String> {
        let mut claims: BTreeSet<String> = OPENID_CLAIMS.iter().map(|c| (*c).to_owned()).collect();
        for scope in scopes {
            let scope = scope.as_ref();
            claims.extend(standard_claims(scope).iter().map(|c| (*c).to_owned()));
            if let Some(custom) = self.custom.get(scope) {
                claims.extend(custom.iter().cloned());
            }
        }
        claims
    }

    /// Project a UserInfo onto the claims released by `scopes`
    pub fn filter<S: AsRef<str>>(&self, user_info: &UserInfo, scopes: &[S]) -> Map<String, Value> {
        let released = self.claims_for(scopes);
        user_info
            .to_json()
            .into_iter()
            .filter(|(claim, _)| released.contains(claim))
            .collect()
    }
}
