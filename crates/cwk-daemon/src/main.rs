//! cwk-daemon entry point.
//!
//! This file is intentionally thin: it loads config, sets up tracing,
//! connects the store, wires middleware, and starts the HTTP server. All
//! route handlers live in `routes.rs`; shared state lives in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use cwk_config::{ConfigMode, DaemonSettings, UnusedKeyPolicy};
use cwk_daemon::{routes, state};
use cwk_db::{PgStore, PoolOptions};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience).
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let cfg = cwk_config::load_from_env()?;
    let settings = DaemonSettings::from_config(&cfg)?;

    init_tracing(&settings.log_filter);
    info!(config_hash = %cfg.config_hash, "config loaded");

    let report =
        cwk_config::report_unused_keys(ConfigMode::Daemon, &cfg.config_json, UnusedKeyPolicy::Warn)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "unused config key");
    }

    let url = cwk_config::resolve_database_url(&settings)?;
    let pool = cwk_db::connect(
        &url,
        PoolOptions {
            max_connections: settings.db_max_connections,
            acquire_timeout: settings.db_acquire_timeout,
        },
    )
    .await?;

    let st = cwk_db::status(&pool).await?;
    if !st.has_catalog_tables {
        warn!("catalog tables missing; run `cwk db migrate`");
    }

    let store = PgStore::new(pool).with_lock_timeout(settings.db_lock_timeout);
    let shared = Arc::new(state::AppState::new(Arc::new(store)));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors(&settings.cors_origins));

    let addr = bind_addr_from_env().unwrap_or(settings.bind_addr);
    info!("cwk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("cwk-daemon stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| configured.into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("CWK_DAEMON_ADDR").ok()?.parse().ok()
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("ctrl-c handler unavailable; shutdown only by kill");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
