//! Document endpoints: upload, processing status, processor health and
//! semantic search over uploaded documents.

use crate::adapter::{extract_document_id, extract_document_status, extract_search_results, lookup};
use crate::models::chat::SourceChunk;
use crate::models::document::{DocumentStatusReport, HealthSource, ProcessorHealth, UploadedDocument};
use crate::services::api_client::ApiClient;
use crate::upload::StatusSource;
use async_trait::async_trait;
use chat_core::ClientError;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

const HEALTHY_STATUSES: &[&str] = &[
    "ok",
    "healthy",
    "available",
    "up",
    "online",
    "ready",
    "running",
    "success",
    "disponível",
    "disponivel",
];

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::Validation(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(filename, bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.filename.trim().is_empty() || self.bytes.is_empty()
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

/// Interpret a processor health body: explicit booleans first, then status strings.
fn parse_health(body: &Value, source: HealthSource) -> Option<ProcessorHealth> {
    const FLAG_PATHS: &[&str] = &[
        "available",
        "healthy",
        "isAvailable",
        "data.available",
        "data.healthy",
        "data.data.available",
        "data.data.healthy",
    ];
    const STATUS_OBJECT_PATHS: &[&str] = &["data.data", "data", ""];

    if let Some(available) = FLAG_PATHS
        .iter()
        .filter_map(|path| lookup(body, path))
        .find_map(Value::as_bool)
    {
        let status = if available { "available" } else { "unavailable" };
        return Some(ProcessorHealth {
            available,
            status: status.to_string(),
            source,
        });
    }

    // A `status` beside a `data` object is the envelope's outcome, not the
    // processor's.
    STATUS_OBJECT_PATHS
        .iter()
        .filter_map(|path| lookup(body, path))
        .find_map(|candidate| match candidate {
            Value::String(status) => Some(status.as_str()),
            Value::Object(object) if !object.get("data").is_some_and(Value::is_object) => {
                object.get("status").and_then(Value::as_str)
            }
            _ => None,
        })
        .map(|status| ProcessorHealth {
            available: HEALTHY_STATUSES.contains(&status.trim().to_lowercase().as_str()),
            status: status.to_string(),
            source,
        })
}

pub struct DocumentClient {
    api: Arc<ApiClient>,
}

impl DocumentClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Multipart upload of `file` into a conversation.
    pub async fn upload(
        &self,
        file: &FileUpload,
        conversation_id: &str,
    ) -> Result<UploadedDocument, ClientError> {
        if file.is_empty() {
            return Err(ClientError::Validation("No file selected".to_string()));
        }
        if conversation_id.trim().is_empty() {
            return Err(ClientError::Validation(
                "Conversation id is required".to_string(),
            ));
        }

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ClientError::Validation(format!("Invalid content type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("conversationId", conversation_id.to_string());

        let response = self.api.post_multipart("/documents/upload", form).await?;

        if let Some(normalized) = response.normalized().canonical() {
            if normalized.is_error() {
                let message = normalized
                    .message
                    .clone()
                    .unwrap_or_else(|| "Upload rejected".to_string());
                tracing::error!(filename = %file.filename, message = %message, "Upload rejected by server");
                return Err(ClientError::Processing(message));
            }
        }

        let document_id =
            extract_document_id(&response.body).ok_or(ClientError::MissingDocumentId)?;

        tracing::info!(
            document_id = %document_id,
            filename = %file.filename,
            size = file.bytes.len(),
            "Document uploaded"
        );

        Ok(UploadedDocument {
            document_id,
            filename: file.filename.clone(),
        })
    }

    pub async fn status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError> {
        let response = self
            .api
            .get(&format!("/documents/{}/status", document_id))
            .await?;

        extract_document_status(&response.body)
            .ok_or_else(|| ClientError::Decode("No status in document status response".to_string()))
    }

    /// Ask the API whether the document processor is up, falling back to the
    /// processor host's own health route.
    pub async fn processor_health(&self) -> Result<ProcessorHealth, ClientError> {
        match self.api.get("/documents/processor-health").await {
            Ok(response) => {
                if let Some(health) = parse_health(&response.body, HealthSource::Api) {
                    return Ok(health);
                }
                tracing::warn!("Unrecognized processor health response, probing processor directly");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Processor health via API failed, probing processor directly");
            }
        }

        let url = format!("{}/health", self.api.processor_url().trim_end_matches('/'));
        match self.api.get_absolute(&url).await {
            Ok(response) => Ok(parse_health(&response.body, HealthSource::Processor).unwrap_or(
                ProcessorHealth {
                    available: true,
                    status: "ok".to_string(),
                    source: HealthSource::Processor,
                },
            )),
            Err(e) => Ok(ProcessorHealth {
                available: false,
                status: e.to_string(),
                source: HealthSource::Processor,
            }),
        }
    }

    /// Relevance-ranked chunks matching `query`.
    pub async fn search(
        &self,
        query: &str,
        conversation_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<SourceChunk>, ClientError> {
        if query.trim().is_empty() {
            return Err(ClientError::Validation("Search query is required".to_string()));
        }

        let mut params = vec![
            ("query", query.to_string()),
            ("limit", limit.max(1).to_string()),
        ];
        if let Some(conversation_id) = conversation_id {
            params.push(("conversationId", conversation_id.to_string()));
        }

        let response = self.api.get_with_query("/documents/search", &params).await?;
        Ok(extract_search_results(&response.body))
    }
}

#[async_trait]
impl StatusSource for DocumentClient {
    async fn fetch_status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError> {
        self.status(document_id).await
    }
}
