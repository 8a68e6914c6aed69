//! Shared state for cwk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>`. The daemon keeps nothing but the
//! store handle: every request reads current state fresh from the store.

use std::sync::Arc;

use cwk_catalog::Store;
use serde::{Deserialize, Serialize};

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            build: BuildInfo {
                service: "cwk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
