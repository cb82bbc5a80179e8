// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod orchestrator;
pub mod scheduler;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::cache::{CacheState, SnapshotCache};
pub use crate::error::TransportError;
pub use crate::orchestrator::RefreshOrchestrator;
pub use crate::snapshot::{EnrichedItem, Snapshot};

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::InsightsConfig;
use crate::ingest::hn::HnClient;

/// Compact fmt logging filtered by `RUST_LOG` (default `hn_insights=info,warn`).
/// A subscriber installed by the host runtime takes precedence.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hn_insights=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Build the HN-backed orchestrator described by `cfg`.
pub fn build_orchestrator(cfg: &InsightsConfig) -> anyhow::Result<Arc<RefreshOrchestrator>> {
    let client = HnClient::new(&cfg.base_url, cfg.connect_timeout(), cfg.request_timeout())?;
    Ok(Arc::new(RefreshOrchestrator::from_config(Arc::new(client), cfg)))
}
