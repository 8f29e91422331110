//! Notion database store (REST API, `2022-06-28` version).

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::NotionConfig;
use crate::error::PersistError;
use crate::store::{ReportRecord, ReportStore};

pub const NOTION_VERSION: &str = "2022-06-28";

pub const TITLE_PROPERTY: &str = "Nieuws";
pub const DATE_PROPERTY: &str = "Datum";
pub const BODY_PROPERTY: &str = "Omschrijving";
pub const REQUIRED_PROPERTIES: [&str; 3] = [TITLE_PROPERTY, DATE_PROPERTY, BODY_PROPERTY];

// Notion caps both rich_text arrays and children at 100 elements per request.
const MAX_ELEMENTS_PER_REQUEST: usize = 100;

pub struct NotionStore {
    http: reqwest::Client,
    api_key: Option<String>,
    database_id: Option<String>,
    base_url: String,
}

impl NotionStore {
    pub fn new(config: &NotionConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("cycling-news-agent/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.database_id.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str), PersistError> {
        match (self.api_key.as_deref(), self.database_id.as_deref()) {
            (Some(key), Some(db)) => Ok((key, db)),
            _ => Err(PersistError::MissingCredentials),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str, key: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(key)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Retrieve the database and check the columns the report writer relies on.
    pub async fn verify_database(&self) -> Result<DatabaseCheck, PersistError> {
        let (key, db) = self.credentials()?;
        let resp = self
            .request(reqwest::Method::GET, &format!("/databases/{db}"), key)
            .send()
            .await?;
        let body = read_success(resp).await?;
        Ok(DatabaseCheck::from_database(&body))
    }
}

#[async_trait::async_trait]
impl ReportStore for NotionStore {
    async fn create_report(&self, record: &ReportRecord) -> Result<(), PersistError> {
        let (key, db) = self.credentials()?;
        if record.body_chunks.len() > MAX_ELEMENTS_PER_REQUEST {
            warn!(
                chunks = record.body_chunks.len(),
                "report exceeds Notion's per-request element limit; the API will likely reject it"
            );
        }
        let payload = page_payload(db, record);
        let resp = self
            .request(reqwest::Method::POST, "/pages", key)
            .json(&payload)
            .send()
            .await?;
        let page = read_success(resp).await?;
        let page_id = page.get("id").and_then(|id| id.as_str()).unwrap_or_default();
        info!(
            page_id,
            chunks = record.body_chunks.len(),
            "notion page created"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notion"
    }
}

/// Create-page body: title, date and rich-text description properties plus one
/// paragraph block per chunk.
pub fn page_payload(database_id: &str, record: &ReportRecord) -> Value {
    let description: Vec<Value> = record
        .body_chunks
        .iter()
        .map(|chunk| json!({ "text": { "content": chunk } }))
        .collect();
    let children: Vec<Value> = record
        .body_chunks
        .iter()
        .map(|chunk| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{ "type": "text", "text": { "content": chunk } }]
                }
            })
        })
        .collect();

    json!({
        "parent": { "database_id": database_id },
        "properties": {
            TITLE_PROPERTY: {
                "title": [{ "text": { "content": record.title_label } }]
            },
            DATE_PROPERTY: {
                "date": { "start": record.date.format("%Y-%m-%d").to_string() }
            },
            BODY_PROPERTY: { "rich_text": description }
        },
        "children": children
    })
}

async fn read_success(resp: reqwest::Response) -> Result<Value, PersistError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<Value>().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    // Notion errors look like {"object":"error","status":401,"code":"...","message":"..."}
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);
    Err(PersistError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DatabaseCheck {
    pub title: String,
    pub properties: Vec<String>,
    pub missing: Vec<String>,
}

impl DatabaseCheck {
    pub fn from_database(body: &Value) -> Self {
        let title = body
            .get("title")
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .and_then(|p| p.get("plain_text"))
            .and_then(Value::as_str)
            .unwrap_or("Naamloze database")
            .to_string();
        let properties: Vec<String> = body
            .get("properties")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        let missing = REQUIRED_PROPERTIES
            .iter()
            .filter(|p| !properties.iter().any(|have| have == *p))
            .map(|p| p.to_string())
            .collect();
        Self {
            title,
            properties,
            missing,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }

    /// Operator-facing summary (Dutch, like the run log).
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Verbinding geslaagd! Database: \"{}\".\nGevonden kolommen: {}.",
            self.title,
            self.properties.join(", ")
        );
        if self.is_ready() {
            msg.push_str("\n✅ Alle benodigde kolommen zijn aanwezig.");
        } else {
            msg.push_str(&format!(
                "\n⚠️ WAARSCHUWING: De volgende kolommen ontbreken in de database: {}. Pas de namen in Notion aan.",
                self.missing.join(", ")
            ));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn payload_has_one_element_per_chunk() {
        let d = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        let rec = ReportRecord::new(&"z".repeat(4100), d);
        let p = page_payload("db-1", &rec);
        assert_eq!(p["parent"]["database_id"], "db-1");
        assert_eq!(
            p["properties"]["Nieuws"]["title"][0]["text"]["content"],
            "Wielernieuws tm 05 okt"
        );
        assert_eq!(p["properties"]["Datum"]["date"]["start"], "2025-10-05");
        assert_eq!(p["properties"]["Omschrijving"]["rich_text"].as_array().unwrap().len(), 3);
        let children = p["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0]["type"], "paragraph");
        assert_eq!(
            children[2]["paragraph"]["rich_text"][0]["text"]["content"]
                .as_str()
                .unwrap()
                .len(),
            100
        );
    }

    #[test]
    fn database_check_reports_missing_columns() {
        let body = json!({
            "title": [{ "plain_text": "Wielerarchief" }],
            "properties": { "Nieuws": {}, "Datum": {}, "Tags": {} }
        });
        let check = DatabaseCheck::from_database(&body);
        assert_eq!(check.title, "Wielerarchief");
        assert_eq!(check.missing, vec!["Omschrijving"]);
        assert!(!check.is_ready());
        assert!(check.message().contains("ontbreken in de database: Omschrijving"));
    }

    #[test]
    fn untitled_database_gets_a_default_name() {
        let body = json!({ "title": [], "properties": { "Nieuws": {}, "Datum": {}, "Omschrijving": {} } });
        let check = DatabaseCheck::from_database(&body);
        assert_eq!(check.title, "Naamloze database");
        assert!(check.is_ready());
        assert!(check.message().ends_with("Alle benodigde kolommen zijn aanwezig."));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let store = NotionStore::new(&NotionConfig {
            api_key: None,
            database_id: Some("db".into()),
            base_url: "http://127.0.0.1:9".into(),
        });
        let d = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        let err = store.create_report(&ReportRecord::new("x", d)).await.unwrap_err();
        assert!(matches!(err, PersistError::MissingCredentials));
    }
}
