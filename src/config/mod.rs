//! Runtime configuration, assembled from environment variables (`.env` is
//! loaded by the binaries through `dotenvy`) and optional keyword files.
//!
//! Missing secrets are not fatal here: the stage that needs them fails the
//! run and the failure shows up in the run log.

pub mod ai;
pub mod notion;

use std::env;
use std::path::PathBuf;

use anyhow::Context;

use crate::ingest::{config::load_ignored_keywords, feed::DEFAULT_FEED_URL};

pub use ai::{AiConfig, ModelChain};
pub use notion::NotionConfig;

pub const ENV_FEED_URL: &str = "FEED_URL";
pub const ENV_ADMIN_TOKEN: &str = "ADMIN_TOKEN";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub feed_url: String,
    pub ignored_keywords: Vec<String>,
    pub ai: AiConfig,
    pub notion: NotionConfig,
    pub admin_token: Option<String>,
    pub scheduler_enabled: bool,
    pub metrics_enabled: bool,
}

impl AgentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            feed_url: env::var(ENV_FEED_URL).unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            ignored_keywords: load_ignored_keywords()?,
            ai: load_ai_config()?,
            notion: NotionConfig::from_env(),
            admin_token: env::var(ENV_ADMIN_TOKEN)
                .ok()
                .filter(|t| !t.trim().is_empty()),
            scheduler_enabled: flag("SCHEDULER_ENABLED", true),
            metrics_enabled: flag("METRICS_ENABLED", false),
        })
    }
}

/// `$AI_CONFIG_PATH`, then `config/ai.json`, else environment variables only.
fn load_ai_config() -> anyhow::Result<AiConfig> {
    let path = env::var(ENV_AI_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_AI_CONFIG_PATH));
    if path.exists() {
        return AiConfig::load_from_file(&path)
            .with_context(|| format!("loading AI config from {}", path.display()));
    }
    Ok(AiConfig::from_env())
}

/// "1"/"true"/"yes"/"on" (case-insensitive) → true; unset → `default`.
pub fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
