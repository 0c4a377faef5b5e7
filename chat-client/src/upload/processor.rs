//! Upload a document into a conversation and follow it until it is indexed.

use crate::models::document::StatusClass;
use crate::services::document_client::{DocumentClient, FileUpload};
use crate::upload::poll::{poll_document_status, PollConfig, PollOutcome, PollUpdate};
use crate::upload::session::{UploadSession, UploadStatus, UploadTracker};
use chat_core::time::{Sleeper, TokioSleeper};
use chat_core::ClientError;
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Result of [`DocumentProcessor::process_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub document_id: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

/// Successful run: the uploaded document and how polling went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub filename: String,
    pub poll: PollOutcome,
}

/// Session progress while polling: 40% at upload, then 60% of the reported
/// progress on top, capped at 99 until completion.
fn session_progress(reported: Option<u8>) -> u8 {
    let reported = f64::from(reported.unwrap_or(0).min(100));
    let progress = (40.0 + reported * 0.6).round() as u8;
    progress.min(99)
}

pub struct DocumentProcessor {
    documents: Arc<DocumentClient>,
    config: PollConfig,
    reset_grace: Duration,
    sleeper: Arc<dyn Sleeper>,
    tracker: UploadTracker,
}

impl DocumentProcessor {
    pub fn new(documents: Arc<DocumentClient>, config: PollConfig, reset_grace: Duration) -> Self {
        Self {
            documents,
            config,
            reset_grace,
            sleeper: Arc::new(TokioSleeper),
            tracker: UploadTracker::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn tracker(&self) -> &UploadTracker {
        &self.tracker
    }

    pub fn session(&self) -> UploadSession {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSession> {
        self.tracker.subscribe()
    }

    pub fn cancel(&self) -> bool {
        self.tracker.cancel()
    }

    /// Upload, poll, and report the result without raising.
    pub async fn process_document(&self, file: &FileUpload, conversation_id: &str) -> ProcessOutcome {
        self.process_with(&self.tracker, file, conversation_id).await
    }

    /// Same as [`process_document`](Self::process_document) but reporting to
    /// `tracker` instead of the processor's own session.
    pub async fn process_with(
        &self,
        tracker: &UploadTracker,
        file: &FileUpload,
        conversation_id: &str,
    ) -> ProcessOutcome {
        let mut document_id = None;
        match self
            .execute(tracker, file, conversation_id, &mut document_id)
            .await
        {
            Ok(processed) => ProcessOutcome {
                success: true,
                document_id: Some(processed.document_id),
                filename: Some(processed.filename),
                error: None,
            },
            Err(e) => ProcessOutcome {
                success: false,
                document_id,
                filename: Some(file.filename.clone()),
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn try_process_document(
        &self,
        file: &FileUpload,
        conversation_id: &str,
    ) -> Result<ProcessedDocument, ClientError> {
        self.try_process_with(&self.tracker, file, conversation_id).await
    }

    /// Validate, check processor health, upload, then poll until the
    /// document reaches a terminal status.
    pub async fn try_process_with(
        &self,
        tracker: &UploadTracker,
        file: &FileUpload,
        conversation_id: &str,
    ) -> Result<ProcessedDocument, ClientError> {
        let mut document_id = None;
        self.execute(tracker, file, conversation_id, &mut document_id)
            .await
    }

    /// One run. `document_id` is filled as soon as the upload returns one.
    async fn execute(
        &self,
        tracker: &UploadTracker,
        file: &FileUpload,
        conversation_id: &str,
        document_id: &mut Option<String>,
    ) -> Result<ProcessedDocument, ClientError> {
        if file.is_empty() {
            return Err(ClientError::Validation("No file selected".to_string()));
        }
        if conversation_id.trim().is_empty() {
            return Err(ClientError::Validation(
                "Conversation id is required".to_string(),
            ));
        }

        let health = self.documents.processor_health().await?;
        if !health.available {
            tracing::warn!(status = %health.status, source = ?health.source, "Document processor unavailable, upload skipped");
            let error = ClientError::ProcessorUnavailable(health.status);
            let generation = tracker.reject(&error.to_string());
            tracker.reset_after(generation, self.reset_grace, self.sleeper.clone());
            return Err(error);
        }

        let generation = tracker.begin(&file.filename, conversation_id);
        let result = self
            .run(tracker, generation, file, conversation_id, document_id)
            .await;

        match &result {
            Ok(_) => {
                tracker.complete(generation);
            }
            Err(ClientError::Cancelled) => {}
            Err(e) => {
                tracker.fail(generation, &e.to_string());
            }
        }
        if tracker.is_current(generation) {
            tracker.reset_after(generation, self.reset_grace, self.sleeper.clone());
        }
        result
    }

    async fn run(
        &self,
        tracker: &UploadTracker,
        generation: u64,
        file: &FileUpload,
        conversation_id: &str,
        document_id: &mut Option<String>,
    ) -> Result<ProcessedDocument, ClientError> {
        let uploaded = self.documents.upload(file, conversation_id).await?;
        *document_id = Some(uploaded.document_id.clone());
        if !tracker.uploaded(generation, &uploaded.document_id) {
            tracing::info!(document_id = %uploaded.document_id, "Upload finished after cancel, not polling");
            return Err(ClientError::Cancelled);
        }

        let poll = poll_document_status(
            self.documents.as_ref(),
            self.sleeper.as_ref(),
            &uploaded.document_id,
            &self.config,
            |update: &PollUpdate| {
                let status = match update.class {
                    StatusClass::Analyzing => UploadStatus::Analyzing,
                    _ => UploadStatus::Processing,
                };
                if tracker.progress(generation, status, session_progress(update.progress)) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            },
        )
        .await?;

        Ok(ProcessedDocument {
            document_id: uploaded.document_id,
            filename: uploaded.filename,
            poll,
        })
    }
}
