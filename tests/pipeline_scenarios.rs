// tests/pipeline_scenarios.rs
//
// End-to-end runs of the orchestrator with in-process doubles:
// fixture feed / failing feed, scripted chat client, memory store.

mod common;

use std::sync::Arc;

use cycling_news_agent::analyze::ai_adapter::MockChatClient;
use cycling_news_agent::config::ModelChain;
use cycling_news_agent::ingest::feed::NosRssFeed;
use cycling_news_agent::ingest::filter::DEFAULT_IGNORED_KEYWORDS;
use cycling_news_agent::ingest::types::FeedSource;
use cycling_news_agent::pipeline::{Agent, RunStage, ERROR_PLACEHOLDER, NO_NEWS_PLACEHOLDER};
use cycling_news_agent::store::MemoryStore;

fn keywords() -> Vec<String> {
    DEFAULT_IGNORED_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn agent(
    feed: Arc<dyn FeedSource>,
    chat: Arc<MockChatClient>,
    store: Arc<MemoryStore>,
    models: &[&str],
) -> Agent {
    Agent::new(
        feed,
        chat,
        store,
        ModelChain::new(models.iter().copied()),
        keywords(),
    )
}

fn fixture_feed() -> Arc<dyn FeedSource> {
    Arc::new(NosRssFeed::from_fixture(common::NOS_FIXTURE))
}

fn position(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|l| l.starts_with(needle))
        .unwrap_or_else(|| panic!("log line starting with {needle:?} not found in {lines:#?}"))
}

#[tokio::test]
async fn five_items_three_kept_one_call_one_record() {
    let chat = Arc::new(MockChatClient::answering_all("Een week vol wielrennen."));
    let store = Arc::new(MemoryStore::new());
    let agent = agent(fixture_feed(), chat.clone(), store.clone(), &["llama-3.3-70b"]);

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(res.success, "logs: {:#?}", res.logs.messages());
    assert_eq!(res.stage, RunStage::Done);
    assert_eq!(res.content, "Een week vol wielrennen.");

    let calls = chat.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "llama-3.3-70b");
    let user = &calls[0].messages[1].content;
    assert_eq!(user.matches("Titel: ").count(), 3);
    let a = user.find("Pogačar wint").unwrap();
    let b = user.find("Van der Poel begint").unwrap();
    let c = user.find("Kooij maakt overstap").unwrap();
    assert!(a < b && b < c, "articles must keep feed order");
    assert!(!user.contains("teamsprint"));
    assert!(!user.contains("Vuelta"));

    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, common::fixed_now().date_naive());
    assert_eq!(records[0].title_label, "Wielernieuws tm 19 okt");
    assert_eq!(records[0].full_body, "Een week vol wielrennen.");

    let lines = res.logs.messages();
    assert!(lines.contains(&"RSS opgehaald: 5 items gevonden.".to_string()));
    assert!(lines.contains(&"Na filter: 3 artikelen overgebleven.".to_string()));
    assert!(lines.contains(
        &"   [3] Kooij maakt overstap naar Decathlon (2025-10-17T21:10:00.000Z)".to_string()
    ));
}

#[tokio::test]
async fn nothing_recent_exits_early_without_model_or_store() {
    let chat = Arc::new(MockChatClient::answering_all("mag niet"));
    let store = Arc::new(MemoryStore::new());
    let agent = agent(fixture_feed(), chat.clone(), store.clone(), &["m"]);

    // A year later every fixture item is stale.
    let later = common::fixed_now() + chrono::Duration::days(365);
    let res = agent.run_at(2, later).await;

    assert!(res.success);
    assert_eq!(res.stage, RunStage::EarlyExit);
    assert_eq!(res.content, NO_NEWS_PLACEHOLDER);
    assert_eq!(res.logs.last(), Some("Geen nieuws gevonden."));
    assert!(chat.calls().is_empty());
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn fetch_failure_stops_the_run() {
    let chat = Arc::new(MockChatClient::answering_all("mag niet"));
    let store = Arc::new(MemoryStore::new());
    let agent = agent(Arc::new(common::FailingFeed), chat.clone(), store.clone(), &["m"]);

    let res = agent.run_at(6, common::fixed_now()).await;

    assert!(!res.success);
    assert_eq!(res.stage, RunStage::Failed);
    assert_eq!(res.content, ERROR_PLACEHOLDER);
    assert_eq!(res.logs.messages()[0], "Starten met ophalen nieuws (6 dagen terug)...");
    assert_eq!(res.logs.last(), Some("Error: feed returned HTTP 503"));
    assert!(chat.calls().is_empty());
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn primary_failure_without_fallback_fails_with_placeholder() {
    let chat = Arc::new(MockChatClient::new().with_failure("llama-3.3-70b", "overloaded"));
    let store = Arc::new(MemoryStore::new());
    let agent = agent(fixture_feed(), chat.clone(), store.clone(), &["llama-3.3-70b"]);

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(!res.success);
    assert_eq!(res.content, ERROR_PLACEHOLDER);
    assert_eq!(chat.calls().len(), 1);
    assert!(store.snapshot().is_empty());
    let lines = res.logs.messages();
    position(&lines, "Fout met primair model llama-3.3-70b: ");
    assert!(!lines.iter().any(|l| l.starts_with("Schakelen naar fallback")));
    assert_eq!(
        res.logs.last(),
        Some("Error: completion API returned HTTP 503: overloaded")
    );
}

#[tokio::test]
async fn fallback_success_is_logged_after_the_primary_failure() {
    let chat = Arc::new(
        MockChatClient::new()
            .with_failure("llama-3.3-70b", "overloaded")
            .with_reply("qwen-3-32b", "Verhaal van de reserve."),
    );
    let store = Arc::new(MemoryStore::new());
    let agent = agent(
        fixture_feed(),
        chat.clone(),
        store.clone(),
        &["llama-3.3-70b", "qwen-3-32b"],
    );

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(res.success);
    assert_eq!(res.content, "Verhaal van de reserve.");
    assert_eq!(store.snapshot()[0].full_body, "Verhaal van de reserve.");

    let lines = res.logs.messages();
    let primary_try = position(&lines, "Cerebras aan het denken met model llama-3.3-70b...");
    let primary_err = position(&lines, "Fout met primair model llama-3.3-70b");
    let switch = position(&lines, "Schakelen naar fallback model qwen-3-32b...");
    let fallback_try = position(&lines, "Cerebras aan het denken met model qwen-3-32b...");
    let done = position(&lines, "Cerebras klaar met schrijven.");
    assert!(primary_try < primary_err);
    assert!(primary_err < switch);
    assert!(switch < fallback_try);
    assert!(fallback_try < done);
}

#[tokio::test]
async fn exhausted_chain_reports_the_fallback_error() {
    let chat = Arc::new(
        MockChatClient::new()
            .with_failure("a", "eerste kapot")
            .with_failure("b", "tweede kapot"),
    );
    let store = Arc::new(MemoryStore::new());
    let agent = agent(fixture_feed(), chat, store.clone(), &["a", "b"]);

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(!res.success);
    assert_eq!(res.content, ERROR_PLACEHOLDER);
    assert_eq!(
        res.logs.last(),
        Some("Error: Fallback model faalde ook: completion API returned HTTP 503: tweede kapot")
    );
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn persist_failure_keeps_the_generated_text() {
    let chat = Arc::new(MockChatClient::answering_all("Tekst die niet werd opgeslagen."));
    let store = Arc::new(MemoryStore::rejecting(400, "body failed validation"));
    let agent = agent(fixture_feed(), chat, store.clone(), &["m"]);

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(!res.success);
    assert_eq!(res.stage, RunStage::Failed);
    assert_eq!(res.content, "Tekst die niet werd opgeslagen.");
    let lines = res.logs.messages();
    position(&lines, "Opslaan in Notion...");
    assert!(!lines.iter().any(|l| l == "Notion save gelukt!"));
    assert_eq!(
        res.logs.last(),
        Some("Error: store rejected the request (HTTP 400): body failed validation")
    );
}

#[tokio::test]
async fn long_narrative_is_chunked_into_the_record() {
    let body = "w".repeat(4_500);
    let chat = Arc::new(MockChatClient::answering_all(body.clone()));
    let store = Arc::new(MemoryStore::new());
    let agent = agent(fixture_feed(), chat, store.clone(), &["m"]);

    let res = agent.run_at(2, common::fixed_now()).await;

    assert!(res.success);
    let rec = &store.snapshot()[0];
    let sizes: Vec<_> = rec.body_chunks.iter().map(|c| c.chars().count()).collect();
    assert_eq!(sizes, vec![2000, 2000, 500]);
    assert_eq!(rec.body_chunks.concat(), body);
}
