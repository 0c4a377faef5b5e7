//! Workflow tests for the document chat client.
//!
//! Each test gets its own [`MockBackend`] speaking the chat API's JSON
//! envelopes, and a [`WorkflowTestContext`] wiring every client service to it.
//! Polling runs on a virtual clock so long processing scenarios finish
//! instantly.
//!
//! ```bash
//! cargo test -p workflow-tests
//! ```

use anyhow::{anyhow, Result};
use chat_client::config::{ApiSettings, Settings};
use chat_client::session::{AuthSession, MemoryTokenStore};
use chat_client::upload::{DocumentProcessor, PollConfig};
use chat_client::AppState;
use chat_core::time::RecordingSleeper;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,chat_client=debug,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Mocked chat API. Routes are mounted per scenario.
pub struct MockBackend {
    pub server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    pub fn processor_url(&self) -> String {
        format!("{}/processor", self.server.uri())
    }

    pub async fn mount_login(&self, token: &str, name: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "token": token,
                    "user": {"_id": Uuid::new_v4().to_string(), "name": name, "email": "user@example.com"}
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Conversation creation; only honoured with `token`.
    pub async fn mount_new_conversation(&self, token: &str, conversation_id: &str, title: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat/conversations"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "success",
                "data": {"conversation": {"_id": conversation_id, "title": title}}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_processor_health(&self, available: bool) {
        Mock::given(method("GET"))
            .and(path("/api/documents/processor-health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {"available": available}
            })))
            .mount(&self.server)
            .await;
    }

    /// Upload route returning `document_id`, then one status response per
    /// entry of `statuses`; the last one repeats forever.
    pub async fn mount_document(&self, document_id: &str, statuses: &[Value]) {
        Mock::given(method("POST"))
            .and(path("/api/documents/upload"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "success",
                "data": {"data": {"documentId": document_id}}
            })))
            .mount(&self.server)
            .await;

        let status_path = format!("/api/documents/{}/status", document_id);
        if let Some((last, leading)) = statuses.split_last() {
            for status in leading {
                Mock::given(method("GET"))
                    .and(path(status_path.as_str()))
                    .respond_with(ResponseTemplate::new(200).set_body_json(status.clone()))
                    .up_to_n_times(1)
                    .mount(&self.server)
                    .await;
            }
            Mock::given(method("GET"))
                .and(path(status_path.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(last.clone()))
                .mount(&self.server)
                .await;
        }
    }

    pub async fn mount_reply(&self, conversation_id: &str, content: &str, sources: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/api/chat/conversations/{}/messages", conversation_id).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "assistantMessage": {
                        "_id": Uuid::new_v4().to_string(),
                        "role": "assistant",
                        "content": content
                    },
                    "sources": sources
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received on `route`.
    pub async fn hits(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == route)
            .count()
    }
}

/// Status body in the shape the document service answers with.
pub fn status_body(status: &str, progress: Option<u8>) -> Value {
    let mut document = json!({"status": status});
    if let Some(progress) = progress {
        document["processing_progress"] = json!(progress);
    }
    json!({"status": "success", "data": {"document": document}})
}

/// Client services wired to a [`MockBackend`], starting logged out.
pub struct WorkflowTestContext {
    pub backend: MockBackend,
    pub state: AppState,
    pub store: Arc<MemoryTokenStore>,
    pub sleeper: Arc<RecordingSleeper>,
    pub processor: DocumentProcessor,
}

impl WorkflowTestContext {
    pub async fn new() -> Result<Self> {
        init_tracing();

        let backend = MockBackend::start().await;
        let settings = Settings {
            api: ApiSettings {
                url: backend.api_url(),
                processor_url: backend.processor_url(),
                timeout_secs: 5,
            },
            ..Default::default()
        };

        let store = Arc::new(MemoryTokenStore::new());
        let session = Arc::new(
            AuthSession::init(store.clone())
                .await
                .map_err(|e| anyhow!("Failed to hydrate session: {}", e))?,
        );
        let state = AppState::new(&settings, session)
            .map_err(|e| anyhow!("Failed to build client: {}", e))?;

        let sleeper = Arc::new(RecordingSleeper::new());
        let processor = DocumentProcessor::new(
            state.documents.clone(),
            settings.polling.poll_config(),
            Duration::from_millis(settings.upload.reset_grace_ms),
        )
        .with_sleeper(sleeper.clone());

        Ok(Self {
            backend,
            state,
            store,
            sleeper,
            processor,
        })
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.processor = DocumentProcessor::new(
            self.state.documents.clone(),
            config,
            Duration::from_secs(3),
        )
        .with_sleeper(self.sleeper.clone());
        self
    }
}
