//! Produced OIDC UserInfo claim set

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::attribute::UserId;

/// OIDC address claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// UserInfo record for one user
///
/// Built once by the claim pipeline and shared read-only afterwards.
/// Serializes to the standard UserInfo JSON shape with custom claims merged
/// in as top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    user_id: UserId,
    sub: String,
    preferred_username: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    middle_name: Option<String>,
    email: Option<String>,
    address: Option<Address>,
    zoneinfo: Option<String>,
    locale: Option<String>,
    phone_number: Option<String>,
    custom_claims: Map<String, Value>,
}

impl UserInfo {
    pub fn builder(user_id: UserId, sub: impl Into<String>) -> UserInfoBuilder {
        UserInfoBuilder {
            info: Self {
                user_id,
                sub: sub.into(),
                preferred_username: None,
                name: None,
                given_name: None,
                family_name: None,
                middle_name: None,
                email: None,
                address: None,
                zoneinfo: None,
                locale: None,
                phone_number: None,
                custom_claims: Map::new(),
            },
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn sub(&self) -> &str {
        &self.sub
    }

    #[must_use]
    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    #[must_use]
    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    #[must_use]
    pub fn middle_name(&self) -> Option<&str> {
        self.middle_name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub const fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    #[must_use]
    pub fn zoneinfo(&self) -> Option<&str> {
        self.zoneinfo.as_deref()
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    #[must_use]
    pub const fn custom_claims(&self) -> &Map<String, Value> {
        &self.custom_claims
    }

    #[must_use]
    pub fn custom_claim(&self, name: &str) -> Option<&Value> {
        self.custom_claims.get(name)
    }

    /// UserInfo JSON object.
    ///
    /// Standard claims take precedence over custom claims of the same name.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        let mut json = self.custom_claims.clone();

        json.insert("sub".into(), Value::String(self.sub.clone()));
        let standard = [
            ("preferred_username", &self.preferred_username),
            ("name", &self.name),
            ("given_name", &self.given_name),
            ("family_name", &self.family_name),
            ("middle_name", &self.middle_name),
            ("email", &self.email),
            ("zoneinfo", &self.zoneinfo),
            ("locale", &self.locale),
            ("phone_number", &self.phone_number),
        ];
        for (claim, value) in standard {
            if let Some(value) = value {
                json.insert(claim.into(), Value::String(value.clone()));
            }
        }
        if let Some(Address {
            formatted: Some(formatted),
        }) = &self.address
        {
            let mut address = Map::new();
            address.insert("formatted".into(), Value::String(formatted.clone()));
            json.insert("address".into(), Value::Object(address));
        }

        json
    }
}

impl Serialize for UserInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Builder used by the claim pipeline; the record is immutable once built
#[derive(Debug)]
pub struct UserInfoBuilder {
    info: UserInfo,
}

impl UserInfoBuilder {
    #[must_use]
    pub fn preferred_username(mut self, value: Option<String>) -> Self {
        self.info.preferred_username = value;
        self
    }

    #[must_use]
    pub fn name(mut self, value: Option<String>) -> Self {
        self.info.name = value;
        self
    }

    #[must_use]
    pub fn given_name(mut self, value: Option<String>) -> Self {
        self.info.given_name = value;
        self
    }

    #[must_use]
    pub fn family_name(mut self, value: Option<String>) -> Self {
        self.info.family_name = value;
        self
    }

    #[must_use]
    pub fn middle_name(mut self, value: Option<String>) -> Self {
        self.info.middle_name = value;
        self
    }

    #[must_use]
    pub fn email(mut self, value: Option<String>) -> Self {
        self.info.email = value;
        self
    }

    #[must_use]
    pub fn address(mut self, formatted: Option<String>) -> Self {
        self.info.address = formatted.map(|formatted| Address {
            formatted: Some(formatted),
        });
        self
    }

    #[must_use]
    pub fn zoneinfo(mut self, value: Option<String>) -> Self {
        self.info.zoneinfo = value;
        self
    }

    #[must_use]
    pub fn locale(mut self, value: Option<String>) -> Self {
        self.info.locale = value;
        self
    }

    #[must_use]
    pub fn phone_number(mut self, value: Option<String>) -> Self {
        self.info.phone_number = value;
        self
    }

    #[must_use]
    pub fn custom_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.info.custom_claims.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> UserInfo {
        self.info
    }
}
