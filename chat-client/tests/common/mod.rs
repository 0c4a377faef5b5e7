use chat_client::config::{ApiSettings, Settings};
use chat_client::session::{AuthSession, MemoryTokenStore};
use chat_client::upload::{DocumentProcessor, PollConfig};
use chat_client::AppState;
use chat_core::time::RecordingSleeper;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-token";

pub struct TestApp {
    pub server: MockServer,
    pub state: AppState,
    pub store: Arc<MemoryTokenStore>,
    pub sleeper: Arc<RecordingSleeper>,
    pub processor: DocumentProcessor,
}

impl TestApp {
    /// Client wired to a fresh mock API, logged in with [`TEST_TOKEN`].
    pub async fn spawn() -> Self {
        Self::spawn_with(PollConfig::default()).await
    }

    pub async fn spawn_with(poll: PollConfig) -> Self {
        chat_core::observability::init_test_tracing();

        let server = MockServer::start().await;
        let settings = Settings {
            api: ApiSettings {
                url: format!("{}/api", server.uri()),
                processor_url: format!("{}/processor", server.uri()),
                timeout_secs: 5,
            },
            ..Default::default()
        };

        let store = Arc::new(MemoryTokenStore::with_token(TEST_TOKEN));
        let session = Arc::new(
            AuthSession::init(store.clone())
                .await
                .expect("Failed to hydrate session"),
        );
        let state = AppState::new(&settings, session).expect("Failed to build client");

        let sleeper = Arc::new(RecordingSleeper::new());
        let processor = DocumentProcessor::new(state.documents.clone(), poll, Duration::from_secs(3))
            .with_sleeper(sleeper.clone());

        Self {
            server,
            state,
            store,
            sleeper,
            processor,
        }
    }

    pub async fn mock_json(&self, http_method: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_healthy_processor(&self) {
        self.mock_json(
            "GET",
            "/api/documents/processor-health",
            200,
            json!({"status": "success", "data": {"available": true}}),
        )
        .await;
    }

    /// Requests received for `route`, in order.
    pub async fn requests_to(&self, route: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == route)
            .collect()
    }
}
