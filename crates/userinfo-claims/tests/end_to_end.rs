//! End-to-end UserInfo resolution over fixture backends

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use userinfo_claims::claims::{ClaimModifier, InitContext};
use userinfo_claims::config::{load_config_from_path, load_from_str};
use userinfo_claims::{
    AdapterError, AdapterFacade, AdapterResult, Attribute, BackendAdapter, Config, ConfigBuilder,
    ExtensionRegistry, RichUser, StaticAdapter, UserId, UserInfoRepository,
};

const FIXTURES: &str = r#"{
    "42": [
        {"urn": "urn:test:login", "value": "alice"},
        {"urn": "urn:test:mail", "value": "alice@example.org"},
        {"urn": "urn:test:entitlements", "value": ["members"]},
        {"urn": "urn:test:groups", "value": ["urn:geant:staff", "urn:geant:members"]},
        {"urn": "urn:test:count", "value": 3}
    ],
    "43": [
        {"urn": "urn:test:mail", "value": "nosub@example.org"}
    ]
}"#;

const CONFIG: &str = r#"
[attributes]
sub = "urn:test:login"
email = "urn:test:mail"

[claims]
custom = ["entitlements", "groups", "count", "unscoped", "broken"]

[properties.custom.claim.entitlements]
scope = "eduperson_entitlement"
attribute = "urn:test:entitlements"

[properties.custom.claim.groups]
scope = "groups"
sourceClass = "attribute"
attribute = "urn:test:groups"
modifierClass = "regex-replace"
find = "^urn:geant:"

[properties.custom.claim.count]
scope = "groups"
attribute = "urn:test:count"
modifierClass = "shout"

[properties.custom.claim.unscoped]
attribute = "urn:test:entitlements"

[properties.custom.claim.broken]
scope = "groups"
sourceClass = "does-not-exist"

[cache]
max_entries = 2
expire_after_access_secs = 60
"#;

#[derive(Debug)]
struct Shout;

impl ClaimModifier for Shout {
    fn modify(&self, value: &str) -> String {
        value.to_uppercase()
    }
}

fn shout(_ctx: &InitContext<'_>) -> userinfo_claims::Result<Box<dyn ClaimModifier>> {
    Ok(Box::new(Shout))
}

/// Fixture adapter that counts fetches and can be switched off
#[derive(Debug)]
struct CountingAdapter {
    inner: StaticAdapter,
    fetches: AtomicUsize,
    down: bool,
    delay: Duration,
}

impl CountingAdapter {
    fn new(inner: StaticAdapter) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            down: false,
            delay: Duration::ZERO,
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for CountingAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_user_attributes(&self, user_id: UserId) -> AdapterResult<RichUser> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.down {
            return Err(AdapterError::Timeout(Duration::from_secs(5)));
        }
        self.inner.get_user_attributes(user_id).await
    }
}

fn fixtures() -> StaticAdapter {
    StaticAdapter::from_json_str("primary", FIXTURES).unwrap()
}

fn config() -> Config {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    load_config_from_path(file.path()).unwrap().build().unwrap()
}

fn registry() -> ExtensionRegistry {
    ExtensionRegistry::with_builtins().with_modifier("shout", shout)
}

#[tokio::test]
async fn test_resolves_standard_and_custom_claims() {
    let repo = UserInfoRepository::new(
        &config(),
        &registry(),
        AdapterFacade::new(Arc::new(fixtures())),
    );

    let info = repo.get_by_username("42").await.unwrap();
    let json = Value::Object(info.to_json());

    assert_eq!(json["sub"], json!("alice"));
    assert_eq!(json["email"], json!("alice@example.org"));
    assert_eq!(json["entitlements"], json!(["members"]));
    assert_eq!(json["groups"], json!(["staff", "members"]));
    // modifiers leave numbers untouched
    assert_eq!(json["count"], json!(3));
    assert!(json.get("unscoped").is_none());
    assert!(json.get("broken").is_none());

    let names: Vec<&str> = repo
        .pipeline()
        .definitions()
        .iter()
        .map(|d| d.claim())
        .collect();
    assert_eq!(names, ["entitlements", "groups", "count"]);
}

#[tokio::test]
async fn test_scope_filtering() {
    let repo = UserInfoRepository::new(
        &config(),
        &registry(),
        AdapterFacade::new(Arc::new(fixtures())),
    );

    let released = repo
        .get_for_scopes("42", &["openid", "eduperson_entitlement"])
        .await
        .unwrap();
    assert_eq!(
        Value::Object(released),
        json!({"sub": "alice", "entitlements": ["members"]})
    );
}

#[tokio::test]
async fn test_missing_sub_fails_and_is_not_cached() {
    let backend = Arc::new(CountingAdapter::new(fixtures()));
    let repo = UserInfoRepository::new(
        &config(),
        &registry(),
        AdapterFacade::new(backend.clone()),
    );

    let err = repo.get_by_username("43").await.unwrap_err();
    assert!(err.is_missing_subject());
    assert!(!repo.cache().contains("43"));

    assert!(repo.get_by_username("43").await.is_err());
    assert_eq!(backend.fetches(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_fetch_once() {
    let mut adapter = CountingAdapter::new(fixtures());
    adapter.delay = Duration::from_millis(50);
    let backend = Arc::new(adapter);
    let repo = UserInfoRepository::new(
        &config(),
        &registry(),
        AdapterFacade::new(backend.clone()),
    );

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.get_by_username("42").await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(backend.fetches(), 1);
    assert!(results.iter().all(|info| Arc::ptr_eq(info, &results[0])));
}

#[tokio::test]
async fn test_fallback_backend() {
    let mut primary = CountingAdapter::new(StaticAdapter::new("primary"));
    primary.down = true;
    let primary = Arc::new(primary);
    let fallback = Arc::new(CountingAdapter::new(fixtures()));

    let facade = AdapterFacade::new(primary.clone())
        .with_fallback(fallback.clone())
        .with_call_fallback(true);
    let repo = UserInfoRepository::new(&config(), &registry(), facade);
    let info = repo.get_by_username("42").await.unwrap();
    assert_eq!(info.sub(), "alice");
    assert_eq!(primary.fetches(), 1);
    assert_eq!(fallback.fetches(), 1);

    let facade = AdapterFacade::new(primary.clone())
        .with_fallback(fallback.clone())
        .with_call_fallback(false);
    let repo = UserInfoRepository::new(&config(), &registry(), facade);
    let err = repo.get_by_username("42").await.unwrap_err();
    assert!(err.is_backend());
    assert_eq!(fallback.fetches(), 1);
}

#[tokio::test]
async fn test_lru_capacity_from_config() {
    let extra = fixtures()
        .with_user(RichUser::new(
            UserId::new(44),
            [Attribute::new("urn:test:login", "bob")],
        ))
        .with_user(RichUser::new(
            UserId::new(45),
            [Attribute::new("urn:test:login", "carol")],
        ));
    let backend = Arc::new(CountingAdapter::new(extra));
    let repo = UserInfoRepository::new(
        &config(),
        &registry(),
        AdapterFacade::new(backend.clone()),
    );

    for key in ["42", "44", "45"] {
        repo.get_by_username(key).await.unwrap();
    }

    assert_eq!(repo.cache().len(), 2);
    assert!(!repo.cache().contains("42"));
    assert_eq!(repo.stats().evictions, 1);

    repo.get_by_username("42").await.unwrap();
    assert_eq!(backend.fetches(), 4);
}

#[tokio::test]
async fn test_sub_modifier_from_properties() {
    let builder = ConfigBuilder::new().sub_attribute("urn:test:login");
    let config = load_from_str(
        r#"
        [properties.attribute.openid.sub]
        modifierClass = "regex-replace"
        find = "^(.*)$"
        replace = "$1@example.org"
        "#,
        builder,
    )
    .unwrap()
    .build()
    .unwrap();

    let repo = UserInfoRepository::new(
        &config,
        ExtensionRegistry::builtin(),
        AdapterFacade::new(Arc::new(fixtures())),
    );
    let info = repo.get_by_username("42").await.unwrap();
    assert_eq!(info.sub(), "alice@example.org");
    assert!(info.custom_claims().is_empty());
}
