//! Report persistence: chunking, the record model, and the store abstraction.
//!
//! The store is append-only from our point of view: one record per successful
//! run, no existence check, no update.

pub mod notion;

use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::PersistError;

/// Per-segment character cap of the store's rich-text fields.
pub const MAX_SEGMENT_CHARS: usize = 2000;

const DUTCH_MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
];

/// Split into contiguous segments of at most `max_chars` code points.
/// Concatenating the output yields `text` again; empty text gives no segments.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let n = max_chars.max(1);
    let mut out = Vec::with_capacity(text.len() / n + 1);
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.char_indices() {
        if count == n {
            out.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(text[start..].to_string());
    }
    out
}

/// `"05 okt"` style label (two-digit day, Dutch short month).
pub fn dutch_date_label(date: NaiveDate) -> String {
    format!(
        "{:02} {}",
        date.day(),
        DUTCH_MONTHS_SHORT[date.month0() as usize]
    )
}

pub fn report_title(run_date: NaiveDate) -> String {
    format!("Wielernieuws tm {}", dutch_date_label(run_date))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub title_label: String,
    /// Run date, not any feed item's date.
    pub date: NaiveDate,
    pub body_chunks: Vec<String>,
    pub full_body: String,
}

impl ReportRecord {
    pub fn new(text: &str, run_date: NaiveDate) -> Self {
        Self {
            title_label: report_title(run_date),
            date: run_date,
            body_chunks: chunk_text(text, MAX_SEGMENT_CHARS),
            full_body: text.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Exactly one create call; all-or-nothing.
    async fn create_report(&self, record: &ReportRecord) -> Result<(), PersistError>;
    fn name(&self) -> &'static str;
}

/// In-memory store for tests and dry runs. Can be told to reject writes.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<ReportRecord>>,
    reject: Option<(u16, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16, message: impl Into<String>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reject: Some((status, message.into())),
        }
    }

    pub fn snapshot(&self) -> Vec<ReportRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryStore {
    async fn create_report(&self, record: &ReportRecord) -> Result<(), PersistError> {
        if let Some((status, message)) = &self.reject {
            return Err(PersistError::Rejected {
                status: *status,
                message: message.clone(),
            });
        }
        self.records
            .lock()
            .map_err(|_| PersistError::Rejected {
                status: 500,
                message: "memory store poisoned".into(),
            })?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
