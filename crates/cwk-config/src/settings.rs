use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::LoadedConfig;

pub const DEFAULT_DATABASE_URL_ENV: &str = "CWK_DATABASE_URL";

/// Typed settings for the daemon (and the database side of the CLI). Every
/// field has a default, so an empty config is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSettings {
    pub bind_addr: SocketAddr,
    /// Allowed browser origins. Empty means no cross-origin access.
    pub cors_origins: Vec<String>,
    /// Name of the env var holding the Postgres URL. Never the URL itself.
    pub database_url_env: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Per-transaction `lock_timeout`; a blocked row lock fails transiently
    /// after this long instead of waiting forever.
    pub db_lock_timeout: Duration,
    pub log_filter: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8899)),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            database_url_env: DEFAULT_DATABASE_URL_ENV.to_string(),
            db_max_connections: 10,
            db_acquire_timeout: Duration::from_secs(5),
            db_lock_timeout: Duration::from_secs(3),
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Raw {
    #[serde(default)]
    daemon: RawDaemon,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    log: RawLog,
}

#[derive(Debug, Default, Deserialize)]
struct RawDaemon {
    bind_addr: Option<String>,
    cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    url_env: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
    lock_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLog {
    filter: Option<String>,
}

impl DaemonSettings {
    pub fn from_config(cfg: &LoadedConfig) -> Result<Self> {
        Self::from_json(&cfg.config_json)
    }

    pub fn from_json(v: &Value) -> Result<Self> {
        let raw: Raw = serde_json::from_value(v.clone()).context("invalid daemon settings")?;
        let mut s = Self::default();

        if let Some(addr) = raw.daemon.bind_addr {
            s.bind_addr = addr
                .parse()
                .with_context(|| format!("daemon.bind_addr is not a socket address: {addr}"))?;
        }
        if let Some(origins) = raw.daemon.cors_origins {
            s.cors_origins = origins;
        }
        if let Some(name) = raw.database.url_env {
            if name.trim().is_empty() {
                bail!("database.url_env must name an environment variable");
            }
            s.database_url_env = name;
        }
        if let Some(n) = raw.database.max_connections {
            if n == 0 {
                bail!("database.max_connections must be at least 1");
            }
            s.db_max_connections = n;
        }
        if let Some(ms) = raw.database.acquire_timeout_ms {
            s.db_acquire_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.database.lock_timeout_ms {
            s.db_lock_timeout = Duration::from_millis(ms);
        }
        if let Some(f) = raw.log.filter {
            s.log_filter = f;
        }
        Ok(s)
    }
}

/// Read the database URL from the env var the settings name. The error
/// names the variable, never its value.
pub fn resolve_database_url(settings: &DaemonSettings) -> Result<String> {
    match std::env::var(&settings.database_url_env) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!(
            "DB_URL_MISSING: env var {} is not set",
            settings.database_url_env
        ),
    }
}
