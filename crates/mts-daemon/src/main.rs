//! mts-daemon entry point: configuration, tracing, shared state, HTTP server.
//! Handlers live in `routes.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use mts_config::{load_layered_yaml, load_layered_yaml_from_strings, secrets, LoadedConfig};
use mts_daemon::{notify::Notifier, routes, state::AppState};
use mts_store::DirTextStore;
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let LoadedConfig {
        config,
        config_hash,
        ..
    } = load_config()?;
    let secrets = secrets::resolve_secrets(&config)?;
    let addr = match std::env::var("MTS_DAEMON_ADDR") {
        Ok(raw) => raw
            .parse::<SocketAddr>()
            .with_context(|| format!("MTS_DAEMON_ADDR '{raw}' is not a socket address"))?,
        Err(_) => config.bind_addr()?,
    };
    let cors = cors_for(&config.daemon.cors_origins);

    info!(
        store = %config.store.root,
        base_path = %config.daemon.base_path,
        %config_hash,
        "mts-daemon configured"
    );

    let store = Arc::new(DirTextStore::new(&config.store.root));
    let lease = store.lease("mts-daemon")?;
    info!(lease = %lease.path().display(), "holding store directory");
    let mut state = AppState::new(config, store)
        .with_config_hash(config_hash)
        .with_configured_audit()?;
    match secrets.webhook_url {
        Some(url) => state = state.with_notifier(Notifier::new(url)?),
        None => info!("no notification webhook configured"),
    }

    let mut app = routes::build_router(Arc::new(state)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("mts-daemon listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
        })
        .await
        .context("server crashed")?;
    drop(lease);
    Ok(())
}

/// `MTS_CONFIG` holds comma-separated YAML layers, later ones winning.
/// Unset means built-in defaults.
fn load_config() -> anyhow::Result<LoadedConfig> {
    let Some(list) = std::env::var("MTS_CONFIG").ok().filter(|l| !l.trim().is_empty()) else {
        return load_layered_yaml_from_strings(&[]);
    };
    let paths: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    load_layered_yaml(&paths)
}

/// `None` when no origins are configured.
fn cors_for(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(AllowHeaders::mirror_request()),
    )
}
