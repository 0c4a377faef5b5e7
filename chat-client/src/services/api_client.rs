use crate::adapter::{Normalized, TransportError, normalize, parse_api_error};
use crate::config::ApiSettings;
use crate::session::AuthSession;
use chat_core::observability::{response_request_id, OutgoingRequest};
use chat_core::ClientError;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Body and status of a successful API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub request_id: Option<String>,
}

impl ApiResponse {
    /// Transport-level view (`{status, data: body}`) fed to the adapter.
    pub fn envelope(&self) -> Value {
        json!({ "status": self.status, "data": self.body })
    }

    pub fn normalized(&self) -> Normalized {
        normalize(&self.envelope())
    }
}

/// HTTP client for the chat API.
///
/// Attaches the session's bearer token and trace headers to every request and
/// turns failures into [`ClientError`]s through the adapter. A 401/403 clears
/// the session.
pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
    session: Arc<AuthSession>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings, session: Arc<AuthSession>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ClientError::Config(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    pub fn processor_url(&self) -> &str {
        &self.settings.processor_url
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, url: &str) -> OutgoingRequest {
        OutgoingRequest::new(&self.client, method, url)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.execute(self.request(Method::GET, &self.url(path)), true).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.request(Method::GET, &self.url(path)).with(|b| b.query(query));
        self.execute(request, true).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.request(Method::POST, &self.url(path)).with(|b| b.json(body));
        self.execute(request, true).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.request(Method::PATCH, &self.url(path)).with(|b| b.json(body));
        self.execute(request, true).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.execute(self.request(Method::DELETE, &self.url(path)), true).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.request(Method::POST, &self.url(path)).with(|b| b.multipart(form));
        self.execute(request, true).await
    }

    /// GET an absolute URL outside the API base (the processor host).
    ///
    /// Sent without the bearer token; a 401/403 from that host leaves the
    /// session untouched.
    pub async fn get_absolute(&self, url: &str) -> Result<ApiResponse, ClientError> {
        self.execute(self.request(Method::GET, url), false).await
    }

    async fn execute(
        &self,
        request: OutgoingRequest,
        authenticated: bool,
    ) -> Result<ApiResponse, ClientError> {
        let method = request.method().clone();
        let url = request.url().to_string();

        let token = if authenticated {
            self.session.token().await
        } else {
            None
        };
        let request = match token {
            Some(token) => request.with(|b| b.bearer_auth(token)),
            None => request,
        };

        let (sent_id, result) = request.send().await;
        let response = result.map_err(|e| {
            tracing::error!(%method, %url, request_id = %sent_id, error = %e, "HTTP request failed");
            ClientError::from(parse_api_error(&TransportError::Network(e.to_string())))
        })?;

        let status = response.status().as_u16();
        let request_id = response_request_id(&response).or(Some(sent_id));
        let text = response.text().await.map_err(|e| {
            tracing::error!(%method, %url, error = %e, "Failed to read response body");
            ClientError::Network(e.to_string())
        })?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!(%method, %url, status, request_id = ?request_id, "API response");

        if (200..300).contains(&status) {
            return Ok(ApiResponse {
                status,
                body,
                request_id,
            });
        }

        if authenticated && (status == 401 || status == 403) {
            tracing::warn!(%method, %url, status, "Session rejected, clearing credentials");
            if let Err(e) = self.session.clear().await {
                tracing::error!(error = %e, "Failed to clear stored session");
            }
        } else {
            tracing::warn!(%method, %url, status, "API call failed");
        }

        Err(parse_api_error(&TransportError::Status {
            code: status,
            body: Some(body),
        })
        .into())
    }
}
