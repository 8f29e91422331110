//! AI adapter: chat-completion client abstraction, the Cerebras (OpenAI-compatible)
//! provider, and a scripted mock.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::AiError;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>>;

/// Trait object used by the synthesizer (and tests).
pub trait ChatClient: Send + Sync {
    /// One completion against `model`; returns the assistant text verbatim.
    fn complete<'a>(&'a self, model: &'a str, messages: &'a [ChatMessage]) -> CompletionFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// Fails when no call can succeed (e.g. missing credentials), before any
    /// model is tried.
    fn ensure_ready(&self) -> Result<(), AiError> {
        Ok(())
    }
}

/// Convenient alias used by callers.
pub type DynChatClient = Arc<dyn ChatClient>;

/// Factory: `AI_TEST_MODE=mock` gives a canned mock, otherwise the Cerebras client.
pub fn build_chat_client(config: &AiConfig) -> DynChatClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockChatClient::answering_all(
            "Wielernieuws (mock): een rustige week in het peloton.",
        ));
    }
    Arc::new(CerebrasClient::new(config))
}

// ------------------------------------------------------------
// Cerebras provider
// ------------------------------------------------------------

/// Cerebras inference API (OpenAI-compatible `/chat/completions`).
pub struct CerebrasClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl CerebrasClient {
    pub fn new(config: &AiConfig) -> Self {
        // Long-form prose takes a while on big models.
        let http = reqwest::Client::builder()
            .user_agent("cycling-news-agent/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn complete_impl(&self, model: &str, messages: &[ChatMessage]) -> Result<String, AiError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(AiError::MissingApiKey);
        };

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&Req { model, messages })
            .send()
            .await
            .map_err(AiError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(model, status.as_u16(), &body));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| AiError::Decode(e.to_string()))?;
        let choice = body.choices.into_iter().next().ok_or(AiError::EmptyChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

impl ChatClient for CerebrasClient {
    fn complete<'a>(&'a self, model: &'a str, messages: &'a [ChatMessage]) -> CompletionFuture<'a> {
        Box::pin(self.complete_impl(model, messages))
    }
    fn provider_name(&self) -> &'static str {
        "cerebras"
    }
    fn ensure_ready(&self) -> Result<(), AiError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(AiError::MissingApiKey),
        }
    }
}

/// 404s and "model not found" bodies mean the model id is wrong or retired;
/// everything else is a plain HTTP failure.
pub fn classify_failure(model: &str, status: u16, body: &str) -> AiError {
    let lower = body.to_ascii_lowercase();
    let unknown_model = status == 404
        || lower.contains("model_not_found")
        || (lower.contains("model")
            && (lower.contains("not found") || lower.contains("does not exist")));
    let message = clip(body, 300);
    if unknown_model {
        AiError::ModelUnavailable {
            model: model.to_string(),
            message,
        }
    } else {
        AiError::Http {
            status,
            body: message,
        }
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Scripted per-model outcomes; records every call.
#[derive(Default)]
pub struct MockChatClient {
    outcomes: HashMap<String, Result<String, String>>,
    default_reply: Option<String>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every model (scripted or not) answers with `text`.
    pub fn answering_all(text: impl Into<String>) -> Self {
        Self {
            default_reply: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_reply(mut self, model: &str, text: impl Into<String>) -> Self {
        self.outcomes.insert(model.to_string(), Ok(text.into()));
        self
    }

    /// `model` fails with an HTTP 503 carrying `message`.
    pub fn with_failure(mut self, model: &str, message: impl Into<String>) -> Self {
        self.outcomes.insert(model.to_string(), Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ChatClient for MockChatClient {
    fn complete<'a>(&'a self, model: &'a str, messages: &'a [ChatMessage]) -> CompletionFuture<'a> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                model: model.to_string(),
                messages: messages.to_vec(),
            });
        }
        let out = match (self.outcomes.get(model), &self.default_reply) {
            (Some(Ok(text)), _) => Ok(text.clone()),
            (Some(Err(msg)), _) => Err(AiError::Http {
                status: 503,
                body: msg.clone(),
            }),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(AiError::ModelUnavailable {
                model: model.to_string(),
                message: "not scripted".into(),
            }),
        };
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
