//! Narrative synthesis: render the filtered items into one prompt and walk the
//! model chain until a completion succeeds.

use metrics::counter;
use tracing::{info, warn};

use crate::analyze::ai_adapter::{ChatClient, ChatMessage};
use crate::config::ModelChain;
use crate::error::SynthesisError;
use crate::ingest::types::FeedItem;
use crate::pipeline::log::RunLog;

/// Persona/style instruction. Output language is Dutch, not configurable.
pub const SYSTEM_PROMPT: &str = "Je bent een gedegen wielrenjournalist, met kennis van alle wielrenkoersen en de geschiedenis van belangrijke wielrenners.
Maak een uitgebreid en diepgaand verslag. Combineer alle feiten tot een vloeiend verhaal, maar wees zeer gedetailleerd.
Geef context bij de overwinningen, noem de teams, de omstandigheden (zoals weer of parcours) en de impact op het klassement of het seizoen.
Maak het een meeslepend verhaal zonder bullets, paragrafen of titels.
Voeg artikel verhalen samen die door de tijd gaan over dezelfde koers. Geef ook het datum bereik aan in de titel zodat we weten over welke periode het nieuws gaat.
maak het compleet en mis absoluut geen enkel detail uit de bronteksten.
Gebruik GEEN markdown opmaak (zoals vetgedrukte tekst met **sterretjes**). Schrijf alleen platte tekst.
De taal MOET Nederlands zijn.";

const ITEM_DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    system_instruction: String,
    items: Vec<FeedItem>,
}

impl SynthesisRequest {
    /// Refuses an empty item list: a model call is never made for zero items.
    pub fn new(items: Vec<FeedItem>) -> Result<Self, SynthesisError> {
        if items.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }
        Ok(Self {
            system_instruction: SYSTEM_PROMPT.to_string(),
            items,
        })
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// System persona + one user message carrying every article.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_instruction.clone()),
            ChatMessage::user(format!(
                "Hier zijn de artikelen:\n{}",
                render_articles(&self.items)
            )),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SynthesisResult {
    pub text: String,
    pub model_used: String,
}

/// `Titel/Datum/Snippet/Link` block per item, `---` after each, newline-joined.
pub fn render_articles(items: &[FeedItem]) -> String {
    items
        .iter()
        .map(|it| {
            format!(
                "Titel: {}\nDatum: {}\nSnippet: {}\nLink: {}\n{ITEM_DELIMITER}",
                it.title,
                it.date_label(),
                it.snippet,
                it.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Try each model in order with identical input; first success wins.
pub async fn synthesize(
    client: &dyn ChatClient,
    request: &SynthesisRequest,
    models: &ModelChain,
    log: &mut RunLog,
) -> Result<SynthesisResult, SynthesisError> {
    if models.is_empty() {
        return Err(SynthesisError::NoModels);
    }
    client.ensure_ready().map_err(SynthesisError::NotReady)?;
    let messages = request.messages();
    let mut last_failure = None;

    for (attempt, model) in models.iter().enumerate() {
        if attempt > 0 {
            log.push(format!("Schakelen naar fallback model {model}..."));
            counter!("agent_model_fallbacks_total").increment(1);
        }
        log.push(format!("Cerebras aan het denken met model {model}..."));

        match client.complete(model, &messages).await {
            Ok(text) => {
                info!(
                    provider = client.provider_name(),
                    model,
                    attempt,
                    chars = text.chars().count(),
                    "synthesis succeeded"
                );
                return Ok(SynthesisResult {
                    text,
                    model_used: model.to_string(),
                });
            }
            Err(e) => {
                let tier = if attempt == 0 { "primair" } else { "fallback" };
                log.push(format!("Fout met {tier} model {model}: {e}"));
                warn!(provider = client.provider_name(), model, attempt, error = %e, "model call failed");
                last_failure = Some((model.to_string(), e));
            }
        }
    }

    // Loop ran at least once, so a failure was recorded.
    let (model, source) = last_failure.ok_or(SynthesisError::NoModels)?;
    if models.len() == 1 {
        Err(SynthesisError::Primary { model, source })
    } else {
        Err(SynthesisError::FallbackExhausted { model, source })
    }
}
