// src/bin/fetch_stories.rs
// One-off refresh: fetch, enrich and cache the ranked stories, then report.
// Usage:
//   cargo run --bin fetch_stories
//   HN_FETCH_LIMIT=10 cargo run --bin fetch_stories

use anyhow::Context;
use hn_insights::config::InsightsConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    hn_insights::init_tracing();

    let cfg = InsightsConfig::load_default().context("loading insights config")?;
    let orchestrator = hn_insights::build_orchestrator(&cfg)?;

    let snapshot = orchestrator
        .get_snapshot()
        .await
        .with_context(|| format!("fetching top stories from {}", cfg.base_url))?;

    println!("Cached {} stories", snapshot.len());
    Ok(())
}
