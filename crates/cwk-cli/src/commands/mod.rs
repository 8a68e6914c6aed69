//! Command handler modules for the `cwk` CLI.
//!
//! Shared setup (config, tracing, database) lives here; command-specific
//! logic lives in the submodules.

pub mod audit;
pub mod seed;

use anyhow::Result;
use cwk_config::{ConfigMode, DaemonSettings, UnusedKeyPolicy};
use cwk_db::{PgPool, PgStore, PoolOptions};
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config from `CWK_CONFIG`, start tracing at the configured
/// level and report keys the CLI does not read.
pub fn load_settings() -> Result<DaemonSettings> {
    let cfg = cwk_config::load_from_env()?;
    let settings = DaemonSettings::from_config(&cfg)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let report =
        cwk_config::report_unused_keys(ConfigMode::Cli, &cfg.config_json, UnusedKeyPolicy::Warn)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "config key not used by cwk");
    }

    Ok(settings)
}

pub async fn connect(settings: &DaemonSettings) -> Result<PgPool> {
    let url = cwk_config::resolve_database_url(settings)?;
    cwk_db::connect(
        &url,
        PoolOptions {
            max_connections: settings.db_max_connections,
            acquire_timeout: settings.db_acquire_timeout,
        },
    )
    .await
}

/// Connected store. Refuses to run against a database without the schema.
pub async fn store(settings: &DaemonSettings) -> Result<PgStore> {
    let pool = connect(settings).await?;
    let st = cwk_db::status(&pool).await?;
    if !st.has_catalog_tables {
        anyhow::bail!("SCHEMA_MISSING: run `cwk db migrate` first");
    }
    Ok(PgStore::new(pool).with_lock_timeout(settings.db_lock_timeout))
}
