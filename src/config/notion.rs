// src/config/notion.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_NOTION_BASE_URL.to_string()
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            base_url: default_base_url(),
        }
    }
}

impl NotionConfig {
    /// NOTION_API_KEY / NOTION_DATABASE_ID / NOTION_BASE_URL.
    pub fn from_env() -> Self {
        let non_blank = |k: &str| env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_blank("NOTION_API_KEY"),
            database_id: non_blank("NOTION_DATABASE_ID"),
            base_url: env::var("NOTION_BASE_URL").unwrap_or_else(|_| default_base_url()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.api_key.is_some() && self.database_id.is_some()
    }
}
