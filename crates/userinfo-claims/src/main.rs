use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use userinfo_claims::config;
use userinfo_claims::observability::{init_observability, shutdown_observability};
use userinfo_claims::{AdapterFacade, ExtensionRegistry, StaticAdapter, UserInfoRepository};

#[derive(Parser, Debug)]
#[command(name = "userinfo-claims")]
#[command(about = "Resolve OpenID Connect UserInfo claims for backend users", long_about = None)]
#[command(version)]
struct Args {
    /// User keys (numeric backend user ids) to resolve
    #[arg(required = true)]
    user_keys: Vec<String>,

    /// JSON fixture file served by the primary backend
    #[arg(short, long, env = "USERINFO_FIXTURES")]
    fixtures: PathBuf,

    /// JSON fixture file served by the fallback backend
    #[arg(long)]
    fallback_fixtures: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only release claims covered by these scopes (repeatable)
    #[arg(short, long = "scope")]
    scopes: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }
    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;
    init_observability(&config.telemetry)?;

    let primary = StaticAdapter::from_path("primary", &args.fixtures)?;
    tracing::info!(users = primary.len(), "primary fixtures loaded");
    let mut backend = AdapterFacade::new(Arc::new(primary)).with_call_fallback(config.call_fallback());
    if let Some(ref path) = args.fallback_fixtures {
        let fallback = StaticAdapter::from_path("fallback", path)?;
        tracing::info!(users = fallback.len(), "fallback fixtures loaded");
        backend = backend.with_fallback(Arc::new(fallback));
    }

    let repository = UserInfoRepository::new(&config, ExtensionRegistry::builtin(), backend);

    let lookups = async {
        let mut failures = 0usize;
        for key in &args.user_keys {
            let result = if args.scopes.is_empty() {
                repository
                    .get_by_username(key)
                    .await
                    .map(|info| Value::Object(info.to_json()))
            } else {
                repository
                    .get_for_scopes(key, &args.scopes)
                    .await
                    .map(Value::Object)
            };

            match result {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{key}: {e}");
                    failures += 1;
                }
            }
        }
        failures
    };

    let failures = tokio::select! {
        failures = lookups => failures,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown_observability();
            anyhow::bail!("interrupted");
        }
    };

    let stats = repository.stats();
    tracing::debug!(
        hits = stats.hits,
        misses = stats.misses,
        loads = stats.loads,
        load_failures = stats.load_failures,
        "cache statistics"
    );
    shutdown_observability();

    if failures > 0 {
        anyhow::bail!("{failures} of {} lookups failed", args.user_keys.len());
    }
    Ok(())
}
