// tests/common/mod.rs
// Shared test doubles for the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use cycling_news_agent::error::FetchError;
use cycling_news_agent::ingest::types::{FeedItem, FeedSource};

pub const NOS_FIXTURE: &str = include_str!("../fixtures/nos_wielrennen.xml");

/// Clock used with the fixture: Sunday 19 Oct 2025, 20:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 19, 20, 0, 0).unwrap()
}

pub fn item_at(title: &str, published_at: DateTime<Utc>) -> FeedItem {
    FeedItem {
        title: title.into(),
        published_at: Some(published_at),
        snippet: format!("{title} (snippet)"),
        link: format!("https://nos.nl/artikel/{}", title.len()),
    }
}

/// Item published `hours` before the real clock.
pub fn recent_item(title: &str, hours: i64) -> FeedItem {
    item_at(title, Utc::now() - Duration::hours(hours))
}

pub struct StaticFeed(pub Vec<FeedItem>);

#[async_trait::async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>, FetchError> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Feed that is down.
pub struct FailingFeed;

#[async_trait::async_trait]
impl FeedSource for FailingFeed {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>, FetchError> {
        Err(FetchError::Status { status: 503 })
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}
