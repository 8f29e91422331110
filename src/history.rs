//! history.rs: bounded in-memory record of recent runs, for diagnostics.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::{RunResult, RunStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Manual,
    Scheduled,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub trigger: RunTrigger,
    pub days_back: u32,
    pub success: bool,
    pub stage: RunStage,
    /// Last log line; on failure this is the `Error: ...` line.
    pub last_log: Option<String>,
    pub content_chars: usize,
}

#[derive(Debug)]
pub struct RunHistory {
    inner: Mutex<Vec<RunSummary>>,
    cap: usize,
}

impl RunHistory {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 1_000);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn record(&self, trigger: RunTrigger, days_back: u32, result: &RunResult) {
        let entry = RunSummary {
            finished_at: Utc::now(),
            trigger,
            days_back,
            success: result.success,
            stage: result.stage,
            last_log: result.logs.last().map(str::to_string),
            content_chars: result.content.chars().count(),
        };

        // A poisoned lock only loses diagnostics.
        let Ok(mut v) = self.inner.lock() else {
            return;
        };
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<RunSummary> {
        let Ok(v) = self.inner.lock() else {
            return Vec::new();
        };
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RunLog;

    fn result(success: bool) -> RunResult {
        let mut logs = RunLog::new();
        logs.push(if success { "Notion save gelukt!" } else { "Error: boom" });
        RunResult {
            success,
            logs,
            content: "tekst".into(),
            stage: if success { RunStage::Done } else { RunStage::Failed },
        }
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let h = RunHistory::with_capacity(2);
        h.record(RunTrigger::Scheduled, 6, &result(true));
        h.record(RunTrigger::Manual, 2, &result(false));
        h.record(RunTrigger::Manual, 2, &result(true));
        let rows = h.snapshot_last_n(10);
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].success);
        assert_eq!(rows[0].last_log.as_deref(), Some("Error: boom"));
        assert_eq!(rows[1].content_chars, 5);
    }
}
