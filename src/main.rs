//! HN Insights Service: binary entrypoint.
//! Boots the Axum HTTP server, wiring the snapshot orchestrator, the refresh
//! scheduler, and the Prometheus exporter.

use hn_insights::api::{self, AppState};
use hn_insights::config::InsightsConfig;
use hn_insights::metrics::Metrics;
use hn_insights::scheduler::spawn_refresh_scheduler;
use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    hn_insights::init_tracing();

    let cfg = InsightsConfig::load_default()?;
    info!(
        base_url = %cfg.base_url,
        fetch_limit = cfg.fetch_limit,
        ttl_secs = cfg.cache_ttl_secs,
        refresh_secs = cfg.refresh_interval_secs,
        "insights config loaded"
    );

    let metrics = Metrics::init(cfg.cache_ttl_secs)?;
    let orchestrator = hn_insights::build_orchestrator(&cfg)?;

    // Periodic refresh keeps the snapshot warm for interactive queries.
    spawn_refresh_scheduler(orchestrator.clone(), cfg.refresh_interval());

    let router = api::router(AppState::new(orchestrator)).merge(metrics.router());

    Ok(router.into())
}
