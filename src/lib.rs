// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod store;

use std::sync::Arc;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::AppState;
use crate::config::AgentConfig;
use crate::history::RunHistory;
use crate::store::notion::NotionStore;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::pipeline::{Agent, RunResult, RunStage};

/// Install the global subscriber: `RUST_LOG` filter, compact text or JSON
/// (`LOG_FORMAT=json`). A second call (or a host runtime that already owns
/// the subscriber) is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cycling_news_agent=info,agent=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Everything the server needs, built from one config.
pub struct App {
    pub agent: Arc<Agent>,
    pub history: Arc<RunHistory>,
    pub router: Router,
}

pub fn build_app(cfg: &AgentConfig) -> anyhow::Result<App> {
    let agent = Arc::new(Agent::from_config(cfg));
    let history = Arc::new(RunHistory::with_capacity(100));
    let state = AppState {
        agent: agent.clone(),
        notion: Arc::new(NotionStore::new(&cfg.notion)),
        history: history.clone(),
        admin_token: cfg.admin_token.clone(),
    };

    let mut router = api::create_router(state);
    if cfg.metrics_enabled {
        router = router.merge(crate::metrics::Metrics::init()?.router());
    }

    if cfg.ai.api_key.is_none() {
        tracing::warn!("CEREBRAS_API_KEY not set; runs will fail at the synthesis stage");
    }
    if !cfg.notion.is_complete() {
        tracing::warn!("Notion credentials incomplete; runs will fail at the persist stage");
    }

    Ok(App {
        agent,
        history,
        router,
    })
}
