//! Cycling news agent: binary entrypoint.
//! Boots the Axum HTTP server (manual trigger, Notion check, health, metrics)
//! and the weekly digest scheduler.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use cycling_news_agent::{build_app, config::AgentConfig, init_tracing, scheduler};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AgentConfig::from_env().context("loading agent configuration")?;
    tracing::info!(
        feed = %cfg.feed_url,
        models = ?cfg.ai.models,
        keywords = cfg.ignored_keywords.len(),
        scheduler = cfg.scheduler_enabled,
        metrics = cfg.metrics_enabled,
        "starting cycling news agent"
    );

    let app = build_app(&cfg)?;
    if cfg.scheduler_enabled {
        scheduler::spawn_weekly_scheduler(app.agent.clone(), app.history.clone());
    }

    Ok(app.router.into())
}
