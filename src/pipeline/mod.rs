// src/pipeline/mod.rs
//! Run orchestration: fetch → filter → synthesize → persist, with one
//! append-only run log and a single structured result. Stage errors never
//! escape `Agent::run`.

pub mod log;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::analyze::ai_adapter::{build_chat_client, DynChatClient};
use crate::analyze::synthesis::{synthesize, SynthesisRequest};
use crate::config::{AgentConfig, ModelChain};
use crate::error::RunError;
use crate::ingest::feed::NosRssFeed;
use crate::ingest::filter::{cutoff_for, filter_items, FilterCriteria};
use crate::ingest::types::FeedSource;
use crate::store::notion::NotionStore;
use crate::store::{ReportRecord, ReportStore};

pub use log::{LogEntry, RunLog};

pub const NO_NEWS_PLACEHOLDER: &str = "Geen nieuws gevonden.";
pub const ERROR_PLACEHOLDER: &str = "Er is een fout opgetreden.";

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Idle,
    Fetching,
    Filtering,
    Synthesizing,
    Persisting,
    EarlyExit,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub logs: RunLog,
    /// Synthesized text when produced, else a placeholder.
    pub content: String,
    pub stage: RunStage,
}

/// Everything a run needs. Stateless between runs; share as `Arc<Agent>`.
pub struct Agent {
    feed: Arc<dyn FeedSource>,
    chat: DynChatClient,
    store: Arc<dyn ReportStore>,
    models: ModelChain,
    excluded_keywords: Vec<String>,
}

/// Mutable state of one run, threaded through the stages.
struct RunState {
    log: RunLog,
    stage: RunStage,
    content: Option<String>,
}

enum Outcome {
    NoNews,
    Stored,
}

impl Agent {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        chat: DynChatClient,
        store: Arc<dyn ReportStore>,
        models: ModelChain,
        excluded_keywords: Vec<String>,
    ) -> Self {
        Self {
            feed,
            chat,
            store,
            models,
            excluded_keywords,
        }
    }

    /// Production wiring: NOS RSS feed, Cerebras (or the mock under
    /// `AI_TEST_MODE=mock`), Notion.
    pub fn from_config(cfg: &AgentConfig) -> Self {
        Self::new(
            Arc::new(NosRssFeed::from_url(cfg.feed_url.clone())),
            build_chat_client(&cfg.ai),
            Arc::new(NotionStore::new(&cfg.notion)),
            cfg.ai.models.clone(),
            cfg.ignored_keywords.clone(),
        )
    }

    pub async fn run(&self, days_back: u32) -> RunResult {
        self.run_at(days_back, Utc::now()).await
    }

    /// Same as [`Agent::run`] with a fixed clock; `now` drives the cutoff and
    /// the record date.
    pub async fn run_at(&self, days_back: u32, now: DateTime<Utc>) -> RunResult {
        let t0 = Instant::now();
        counter!("agent_runs_total").increment(1);

        let mut state = RunState {
            log: RunLog::new(),
            stage: RunStage::Idle,
            content: None,
        };

        let result = match self.execute(days_back, now, &mut state).await {
            Ok(Outcome::NoNews) => RunResult {
                success: true,
                logs: state.log,
                content: NO_NEWS_PLACEHOLDER.to_string(),
                stage: RunStage::EarlyExit,
            },
            Ok(Outcome::Stored) => RunResult {
                success: true,
                logs: state.log,
                content: state.content.unwrap_or_default(),
                stage: RunStage::Done,
            },
            Err(e) => {
                error!(stage = e.stage_label(), failed_at = ?state.stage, error = %e, "run failed");
                counter!("agent_run_failures_total", "stage" => e.stage_label()).increment(1);
                state.log.push(format!("Error: {e}"));
                RunResult {
                    success: false,
                    logs: state.log,
                    content: state
                        .content
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| ERROR_PLACEHOLDER.to_string()),
                    stage: RunStage::Failed,
                }
            }
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("agent_run_ms").record(ms);
        info!(
            days_back,
            success = result.success,
            stage = ?result.stage,
            log_lines = result.logs.len(),
            elapsed_ms = ms as u64,
            "run finished"
        );
        result
    }

    async fn execute(
        &self,
        days_back: u32,
        now: DateTime<Utc>,
        state: &mut RunState,
    ) -> Result<Outcome, RunError> {
        state
            .log
            .push(format!("Starten met ophalen nieuws ({days_back} dagen terug)..."));
        if days_back == 0 {
            return Err(RunError::InvalidDaysBack);
        }
        if cutoff_for(now, days_back).is_none() {
            return Err(RunError::DaysBackOutOfRange(days_back));
        }

        state.stage = RunStage::Fetching;
        let items = self.feed.fetch_items().await?;
        debug!(source = self.feed.name(), items = items.len(), "feed fetched");
        state
            .log
            .push(format!("RSS opgehaald: {} items gevonden.", items.len()));

        state.stage = RunStage::Filtering;
        let criteria = FilterCriteria::new(now, days_back, &self.excluded_keywords);
        state.log.push(format!(
            "Cutoff datum: {}",
            criteria.cutoff.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        let kept = filter_items(items, &criteria);
        counter!("agent_items_kept_total").increment(kept.len() as u64);
        state
            .log
            .push(format!("Na filter: {} artikelen overgebleven.", kept.len()));
        for (i, item) in kept.iter().enumerate() {
            state
                .log
                .push(format!("   [{}] {} ({})", i + 1, item.title, item.date_label()));
        }

        if kept.is_empty() {
            state.log.push(NO_NEWS_PLACEHOLDER);
            return Ok(Outcome::NoNews);
        }

        state.stage = RunStage::Synthesizing;
        state.log.push("Artikelen voorbereiden voor Cerebras...");
        let request = SynthesisRequest::new(kept)?;
        let synthesis = synthesize(self.chat.as_ref(), &request, &self.models, &mut state.log).await?;
        state.log.push("Cerebras klaar met schrijven.");
        info!(model = %synthesis.model_used, chars = synthesis.text.chars().count(), "narrative ready");
        state.content = Some(synthesis.text);

        state.stage = RunStage::Persisting;
        state.log.push("Opslaan in Notion...");
        let record = ReportRecord::new(state.content.as_deref().unwrap_or_default(), now.date_naive());
        debug!(store = self.store.name(), chunks = record.body_chunks.len(), "persisting report");
        self.store.create_report(&record).await?;
        counter!("agent_reports_created_total").increment(1);
        state.log.push("Notion save gelukt!");

        state.stage = RunStage::Done;
        Ok(Outcome::Stored)
    }
}
