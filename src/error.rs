//! Error taxonomy for the pipeline stages.
//!
//! Every stage returns its own error type; the orchestrator folds them into
//! [`RunError`] and converts that into a failed `RunResult` at its boundary.

/// Feed retrieval / parsing failure. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("feed could not be parsed: {0}")]
    Parse(String),
}

/// A single text-generation call failed.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("CEREBRAS_API_KEY is missing")]
    MissingApiKey,

    #[error("model {model} is unavailable: {message}")]
    ModelUnavailable { model: String, message: String },

    #[error("completion request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("completion API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("completion response could not be decoded: {0}")]
    Decode(String),

    #[error("completion response contained no choices")]
    EmptyChoices,
}

/// Every model of the chain failed (or the request was unusable).
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("no model configured")]
    NoModels,

    #[error("nothing to synthesize: zero items")]
    EmptyInput,

    /// The client cannot make any call; no model was tried.
    #[error(transparent)]
    NotReady(AiError),

    /// Single-model chain: the primary error is surfaced as-is.
    #[error("{source}")]
    Primary {
        model: String,
        #[source]
        source: AiError,
    },

    #[error("Fallback model faalde ook: {source}")]
    FallbackExhausted {
        model: String,
        #[source]
        source: AiError,
    },
}

/// The store rejected (or never received) the new record.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("NOTION_API_KEY or NOTION_DATABASE_ID is missing")]
    MissingCredentials,

    #[error("store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("store rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Union of all stage failures, as seen by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("daysBack must be a positive integer")]
    InvalidDaysBack,

    #[error("daysBack {0} reaches before the earliest supported date")]
    DaysBackOutOfRange(u32),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl RunError {
    /// Short stage label used as a metrics dimension.
    pub fn stage_label(&self) -> &'static str {
        match self {
            RunError::InvalidDaysBack | RunError::DaysBackOutOfRange(_) => "input",
            RunError::Fetch(_) => "fetch",
            RunError::Synthesis(_) => "synthesis",
            RunError::Persist(_) => "persist",
        }
    }
}
