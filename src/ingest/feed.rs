// src/ingest/feed.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::error::FetchError;
use crate::ingest::normalize_snippet;
use crate::ingest::types::{FeedItem, FeedSource};

pub const DEFAULT_FEED_URL: &str = "https://feeds.nos.nl/nossportwielrennen";

/// Item children we read. Matched on the qualified name, so `media:title`
/// or `atom:link` never stand in for `title` or `link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
    DcDate,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" => Some(Self::Description),
            b"pubDate" => Some(Self::PubDate),
            b"dc:date" => Some(Self::DcDate),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    dc_date: Option<String>,
}

impl RawItem {
    /// First occurrence wins.
    fn fill(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::DcDate => &mut self.dc_date,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn into_feed_item(self) -> FeedItem {
        let published_at = self
            .pub_date
            .as_deref()
            .and_then(parse_feed_date)
            .or_else(|| self.dc_date.as_deref().and_then(parse_feed_date));
        FeedItem {
            title: self.title.unwrap_or_default().trim().to_string(),
            published_at,
            snippet: normalize_snippet(self.description.as_deref().unwrap_or_default()),
            link: self.link.unwrap_or_default().trim().to_string(),
        }
    }
}

/// Walk the document once, collecting the direct children of every `<item>`.
/// Text outside CDATA may carry any HTML named entity; it is decoded here
/// instead of by the XML reader, which only knows the five XML ones.
fn read_items(xml: &str) -> Result<Vec<RawItem>, FetchError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut saw_channel = false;
    let mut item: Option<(usize, RawItem)> = None;
    let mut field: Option<(Field, String)> = None;
    let mut items = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| FetchError::Parse(e.to_string()))?
        {
            Event::Start(e) => {
                depth += 1;
                let item_depth = item.as_ref().map(|(d, _)| *d);
                match e.name().as_ref() {
                    b"channel" => saw_channel = true,
                    b"item" if item_depth.is_none() => item = Some((depth, RawItem::default())),
                    tag if item_depth.map(|d| d + 1) == Some(depth) => {
                        field = Field::from_tag(tag).map(|f| (f, String::new()));
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                let item_depth = item.as_ref().map(|(d, _)| *d);
                if item_depth.map(|d| d + 1) == Some(depth) {
                    if let (Some((f, text)), Some((_, raw))) = (field.take(), item.as_mut()) {
                        raw.fill(f, text);
                    }
                } else if item_depth == Some(depth) {
                    items.extend(item.take().map(|(_, raw)| raw));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&html_escape::decode_html_entities(&String::from_utf8_lossy(&t)));
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(FetchError::Parse(format!(
            "document ended with {depth} unclosed element(s)"
        )));
    }
    if !saw_channel {
        return Err(FetchError::Parse("no <channel> element".into()));
    }
    Ok(items)
}

/// Parse an RSS date: RFC 2822 (`pubDate`) first, then RFC 3339 (`dc:date`).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // `time` wants a numeric offset; feeds commonly write GMT/UT.
    let numeric = match raw.rsplit_once(' ') {
        Some((head, "GMT" | "UT" | "UTC" | "Z")) => format!("{head} +0000"),
        _ => raw.to_string(),
    };
    let odt = OffsetDateTime::parse(&numeric, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()?
        .to_offset(UtcOffset::UTC);
    DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

/// RSS source for the NOS cycling feed (or any RSS 2.0 URL).
pub struct NosRssFeed {
    mode: Mode,
}

enum Mode {
    // Own copy so tests don't need a 'static fixture.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl NosRssFeed {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("cycling-news-agent/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<FeedItem>, FetchError> {
        let t0 = std::time::Instant::now();
        let out: Vec<FeedItem> = read_items(s)?
            .into_iter()
            .map(RawItem::into_feed_item)
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("agent_feed_parse_ms").record(ms);
        counter!("agent_feed_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for NosRssFeed {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                let resp = match client.get(url.as_str()).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::warn!(error = %e, %url, "feed http error");
                        counter!("agent_feed_errors_total").increment(1);
                        return Err(FetchError::Network(e));
                    }
                };
                let status = resp.status();
                if !status.is_success() {
                    counter!("agent_feed_errors_total").increment(1);
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                    });
                }
                let body = resp.text().await?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "nos-wielrennen"
    }
}
