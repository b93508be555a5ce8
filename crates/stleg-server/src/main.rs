use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use stleg_core::RouteClassifier;
use stleg_crypto::{KeyDirectory, TokenVerifier};
use stleg_gateway::{AdmissionController, GatewayState, OverageRates, PipelineConfig, PrioritySplit};
use stleg_revocation::{BloomCrl, BloomCrlConfig};
use stleg_server::key_source::{FileKeyDirectorySource, KeyDirectoryReload};
use stleg_server::seed::RevocationSeedReload;
use stleg_server::{AppState, ConfigWatcher, ServerConfig};
use stleg_state::{MemoryStateStore, StateStore};

/// License Enforcement Gateway server: wires the admission pipeline in front
/// of a reverse-proxied upstream API, plus its own administrative API.
#[derive(Parser, Debug)]
#[command(name = "stleg-server", about = "License Enforcement Gateway server")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "stleg-server.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = stleg_server::config::load(Path::new(&cli.config))?;

    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());

    let key_source = Arc::new(FileKeyDirectorySource::new(config.keys.path.clone()));
    let key_directory = Arc::new(KeyDirectory::new());
    if let Err(err) = key_directory.refresh(key_source.as_ref()).await {
        tracing::warn!(error = %err, path = %config.keys.path, "initial key directory load failed, starting with an empty directory");
    }
    let verifier = Arc::new(TokenVerifier::with_source(
        key_directory.clone(),
        key_source.clone(),
    ));

    let revocation = Arc::new(BloomCrl::new(BloomCrlConfig {
        capacity: config.revocation.bloom_capacity,
        false_positive_rate: config.revocation.bloom_false_positive_rate,
        refresh_interval: Duration::from_secs(config.revocation.refresh_interval_seconds),
    }));

    if let Some(seed_path) = &config.revocation.seed_path {
        let seed = RevocationSeedReload::new(seed_path.clone(), revocation.clone(), store.clone());
        if let Err(err) = seed.apply().await {
            tracing::warn!(error = %err, path = seed_path, "initial revocation seed load failed");
        }
        if config.revocation.watch {
            ConfigWatcher::new(seed_path.clone(), Arc::new(seed)).spawn();
        }
    }

    if config.keys.watch {
        let reload = KeyDirectoryReload::new(key_directory.clone(), key_source.clone());
        ConfigWatcher::new(config.keys.path.clone(), Arc::new(reload)).spawn();
    }

    {
        let revocation = revocation.clone();
        let store = store.clone();
        tokio::spawn(async move {
            revocation.run_background_refresh(store.as_ref()).await;
        });
    }

    let routes = Arc::new(RouteClassifier::new(
        config
            .public_routes
            .iter()
            .map(|r| (r.method.clone(), r.path.clone())),
    ));

    let priority_split = match (config.admission.sponsor_permits, config.admission.free_permits) {
        (Some(sponsor_permits), Some(free_permits)) => Some(PrioritySplit {
            sponsor_permits,
            free_permits,
        }),
        _ => None,
    };
    let admission = Arc::new(AdmissionController::new(config.admission.permits, priority_split));

    let overage_rates = OverageRates {
        per_unit_rate: config.overage_rates.clone(),
    };
    let pipeline_config = PipelineConfig {
        grace_period: Duration::from_secs(config.grace_period.days * 24 * 3600),
        admission_permits: config.admission.permits,
        priority_split,
        overage_rates,
    };

    let metered_routes: HashMap<String, String> = config
        .metered_routes
        .iter()
        .map(|r| (format!("{}:{}", r.method.to_uppercase(), r.path_prefix), r.resource.clone()))
        .collect();

    let gateway = Arc::new(GatewayState {
        verifier,
        revocation,
        store,
        routes,
        admission,
        config: pipeline_config,
        metered_routes,
    });

    let state = AppState {
        gateway,
        admin_token_hash: config.admin.token_hash.clone(),
        upstream_base_url: config.upstream.base_url,
        upstream_timeout_seconds: config.upstream.timeout_seconds,
        upstream_client: reqwest::Client::new(),
    };

    let app = stleg_server::router::build(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "stleg-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("stleg-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
