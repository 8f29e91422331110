// src/ingest/types.rs
use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::FetchError;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub published_at: Option<DateTime<Utc>>, // None = no parseable date
    pub snippet: String,                     // tag-free, whitespace collapsed
    pub link: String,
}

impl FeedItem {
    /// ISO-8601 rendering used in prompts and run logs (`2025-10-19T12:00:00.000Z`).
    pub fn date_label(&self) -> String {
        self.published_at
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>, FetchError>;
    fn name(&self) -> &'static str;
}
