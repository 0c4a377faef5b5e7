use serde::{Deserialize, Serialize};

/// Backend status strings that mean processing finished successfully.
const COMPLETED_STATUSES: &[&str] = &[
    "completed",
    "complete",
    "finalizado",
    "concluído",
    "concluido",
    "success",
    "disponível",
    "disponivel",
    "available",
    "ready",
    "processed",
];

/// Backend status strings that mean processing failed.
const ERROR_STATUSES: &[&str] = &["error", "failed", "erro", "falha", "unavailable"];

/// Pending statuses that indicate the analysis/indexing phase.
const ANALYZING_STATUSES: &[&str] = &[
    "analyzing",
    "analysing",
    "indexing",
    "embedding",
    "analisando",
    "indexando",
];

/// Outcome of classifying a backend document status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Completed,
    Failed,
    Processing,
    Analyzing,
}

impl StatusClass {
    pub fn is_terminal(self) -> bool {
        matches!(self, StatusClass::Completed | StatusClass::Failed)
    }
}

/// The single place where backend status strings are interpreted.
///
/// Matching is case-insensitive and ignores surrounding whitespace; anything
/// unknown is treated as still processing.
pub fn classify_status(raw: &str) -> StatusClass {
    let status = raw.trim().to_lowercase();
    let status = status.as_str();

    if COMPLETED_STATUSES.contains(&status) {
        StatusClass::Completed
    } else if ERROR_STATUSES.contains(&status) {
        StatusClass::Failed
    } else if ANALYZING_STATUSES.contains(&status) {
        StatusClass::Analyzing
    } else {
        StatusClass::Processing
    }
}

/// Status of one document as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatusReport {
    pub status: String,
    /// `processing_progress` reported by the backend (0-100).
    pub progress: Option<u8>,
    /// `processing_error` reported by the backend.
    pub error: Option<String>,
    pub message: Option<String>,
}

impl DocumentStatusReport {
    pub fn class(&self) -> StatusClass {
        classify_status(&self.status)
    }

    /// Message for a failed document: response message, then processing
    /// error, then a generic fallback.
    pub fn failure_message(&self) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.error.as_deref().filter(|e| !e.trim().is_empty()))
            .unwrap_or("Document processing failed")
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthSource {
    /// `GET {api}/documents/processor-health`
    Api,
    /// `GET {processor_url}/health`
    Processor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorHealth {
    pub available: bool,
    pub status: String,
    pub source: HealthSource,
}

/// Identifier and name of a freshly uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub document_id: String,
    pub filename: String,
}
