// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const DEFAULT_PRIMARY_MODEL: &str = "llama-3.3-70b";

/// Ordered model identifiers: primary first, then fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelChain(Vec<String>);

impl ModelChain {
    /// Blank and duplicate identifiers are dropped; order is kept.
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for m in models {
            let m = m.into().trim().to_string();
            if !m.is_empty() && !out.contains(&m) {
                out.push(m);
            }
        }
        Self(out)
    }

    /// `primary` plus a comma-separated fallback list (`"a, b"`).
    pub fn from_primary_and_fallbacks(primary: &str, fallbacks: Option<&str>) -> Self {
        let rest = fallbacks.unwrap_or_default().split(',');
        Self::new(std::iter::once(primary).chain(rest))
    }

    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "ENV" means: read from CEREBRAS_API_KEY. `None` surfaces as a run failure.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_models")]
    pub models: ModelChain,
}

fn default_base_url() -> String {
    DEFAULT_CEREBRAS_BASE_URL.to_string()
}

fn default_models() -> ModelChain {
    ModelChain::new([DEFAULT_PRIMARY_MODEL])
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            models: default_models(),
        }
    }
}

impl AiConfig {
    /// CEREBRAS_API_KEY / CEREBRAS_BASE_URL / CEREBRAS_MODEL / CEREBRAS_MODEL_FALLBACK.
    pub fn from_env() -> Self {
        let primary = env::var("CEREBRAS_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string());
        let fallbacks = env::var("CEREBRAS_MODEL_FALLBACK").ok();
        let mut models = ModelChain::from_primary_and_fallbacks(&primary, fallbacks.as_deref());
        if models.is_empty() {
            models = default_models();
        }
        Self {
            api_key: env::var("CEREBRAS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            base_url: env::var("CEREBRAS_BASE_URL").unwrap_or_else(|_| default_base_url()),
            models,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Resolve api key if "ENV"
        if cfg
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().eq_ignore_ascii_case("env"))
        {
            cfg.api_key = Some(
                env::var("CEREBRAS_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing CEREBRAS_API_KEY env var"))?,
            );
        }
        if cfg.models.is_empty() {
            anyhow::bail!("ai config lists no models");
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_keeps_order_and_drops_blanks_and_dupes() {
        let c = ModelChain::from_primary_and_fallbacks(
            "llama-3.3-70b",
            Some(" qwen-3-32b, ,llama-3.3-70b,gpt-oss-120b"),
        );
        let v: Vec<_> = c.iter().collect();
        assert_eq!(v, vec!["llama-3.3-70b", "qwen-3-32b", "gpt-oss-120b"]);
        assert_eq!(c.primary(), Some("llama-3.3-70b"));
    }

    #[test]
    fn chain_without_fallback_has_one_tier() {
        let c = ModelChain::from_primary_and_fallbacks("llama-3.3-70b", None);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn file_config_defaults_fill_in() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ai.json");
        fs::write(&p, r#"{"api_key":"k-123","models":["a","b"]}"#).unwrap();
        let cfg = AiConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("k-123"));
        assert_eq!(cfg.base_url, DEFAULT_CEREBRAS_BASE_URL);
        assert_eq!(cfg.models.len(), 2);
    }
}
