// src/ingest/filter.rs
//! Recency + topic filter over feed items. Pure, no I/O.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::ingest::types::FeedItem;

/// Track-cycling terms; stories about the velodrome are out of scope.
pub const DEFAULT_IGNORED_KEYWORDS: &[&str] = &[
    "baanwielrennen",
    "baan",
    "velodrome",
    "teamsprint",
    "keirin",
    "omnium",
    "afvalkoers",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Exclusive lower bound.
    pub cutoff: DateTime<Utc>,
    /// Lowercased.
    pub excluded_keywords: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Undated,
    Stale,
    Excluded(String),
}

/// `now - days_back days`, or `None` when that lies before chrono's range.
pub fn cutoff_for(now: DateTime<Utc>, days_back: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::days(i64::from(days_back)))
}

impl FilterCriteria {
    /// `cutoff = now - days_back days`, saturating at the earliest
    /// representable instant.
    pub fn new<I, S>(now: DateTime<Utc>, days_back: u32, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            cutoff: cutoff_for(now, days_back).unwrap_or(DateTime::<Utc>::MIN_UTC),
            excluded_keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn verdict(&self, item: &FeedItem) -> Verdict {
        let Some(published) = item.published_at else {
            return Verdict::Undated;
        };
        if published <= self.cutoff {
            return Verdict::Stale;
        }
        let title = item.title.to_lowercase();
        let snippet = item.snippet.to_lowercase();
        match self
            .excluded_keywords
            .iter()
            .find(|k| title.contains(k.as_str()) || snippet.contains(k.as_str()))
        {
            Some(k) => Verdict::Excluded(k.clone()),
            None => Verdict::Keep,
        }
    }
}

/// Keep recent, on-topic items; input order is preserved.
pub fn filter_items(items: Vec<FeedItem>, criteria: &FilterCriteria) -> Vec<FeedItem> {
    items
        .into_iter()
        .filter(|it| {
            let v = criteria.verdict(it);
            if v != Verdict::Keep {
                tracing::debug!(title = %it.title, verdict = ?v, "item dropped");
            }
            v == Verdict::Keep
        })
        .collect()
}
