use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::history::{RunHistory, RunSummary, RunTrigger};
use crate::pipeline::Agent;
use crate::store::notion::NotionStore;

/// Window used by the manual trigger (short, for testing the pipeline).
pub const MANUAL_DAYS_BACK: u32 = 2;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub notion: Arc<NotionStore>,
    pub history: Arc<RunHistory>,
    pub admin_token: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/manual-trigger", post(manual_trigger))
        .route("/api/test-notion", post(test_notion))
        .route("/api/runs", get(recent_runs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Request came in through a loopback host name.
fn is_local(headers: &HeaderMap) -> bool {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.contains("localhost") || h.contains("127.0.0.1"))
}

fn has_admin_token(headers: &HeaderMap, token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|given| given == token)
}

async fn manual_trigger(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !is_local(&headers) && !has_admin_token(&headers, state.admin_token.as_deref()) {
        tracing::warn!(target: "api", "manual trigger rejected: not local and no valid token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    tracing::info!(target: "api", days_back = MANUAL_DAYS_BACK, "manual trigger started");
    let result = state.agent.run(MANUAL_DAYS_BACK).await;
    state
        .history
        .record(RunTrigger::Manual, MANUAL_DAYS_BACK, &result);

    Json(json!({
        "success": result.success,
        "logs": result.logs,
        "result": result.content,
    }))
    .into_response()
}

async fn test_notion(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !is_local(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized: Test tools only available on localhost" })),
        )
            .into_response();
    }
    if !state.notion.is_configured() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Configuratie fout: NOTION_API_KEY of NOTION_DATABASE_ID ontbreekt."
            })),
        )
            .into_response();
    }

    match state.notion.verify_database().await {
        Ok(check) => Json(json!({
            "success": check.is_ready(),
            "message": check.message(),
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(target: "api", error = %e, "notion connectivity check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": format!("Notion Error: {e}") })),
            )
                .into_response()
        }
    }
}

async fn recent_runs(State(state): State<AppState>) -> Json<Vec<RunSummary>> {
    Json(state.history.snapshot_last_n(20))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn loopback_hosts_are_local() {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("localhost:8000"));
        assert!(is_local(&h));
        h.insert(header::HOST, HeaderValue::from_static("127.0.0.1:8888"));
        assert!(is_local(&h));
        h.insert(header::HOST, HeaderValue::from_static("wielernieuws.example.org"));
        assert!(!is_local(&h));
        assert!(!is_local(&HeaderMap::new()));
    }

    #[test]
    fn token_must_match_exactly() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(has_admin_token(&h, Some("s3cret")));
        assert!(!has_admin_token(&h, Some("other")));
        // No configured token: nobody remote gets in.
        assert!(!has_admin_token(&h, None));
    }
}
