//! Document status polling with adaptive intervals.

use crate::models::document::{DocumentStatusReport, StatusClass};
use async_trait::async_trait;
use chat_core::time::Sleeper;
use chat_core::ClientError;
use std::ops::ControlFlow;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Reported progress (percent) above which polling speeds up.
    pub fast_threshold: u8,
    pub min_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
            fast_threshold: 80,
            min_interval: Duration::from_millis(500),
        }
    }
}

impl PollConfig {
    /// Delay before the next attempt. Halves the current delay, down to
    /// `min_interval`, once progress passes `fast_threshold`; otherwise the base
    /// interval.
    pub fn next_interval(&self, current: Duration, progress: Option<u8>) -> Duration {
        match progress {
            Some(progress) if progress > self.fast_threshold => {
                let floor = self.min_interval.min(self.interval);
                (current / 2).max(floor)
            }
            _ => self.interval,
        }
    }
}

/// Anything that can report a document's processing status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub success: bool,
    pub status: String,
    pub progress: u8,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// A non-terminal status observed while polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollUpdate {
    pub attempt: u32,
    pub class: StatusClass,
    pub progress: Option<u8>,
}

/// Poll `document_id` until it completes, fails, or `max_attempts` run out.
///
/// Transient errors are retried at the base interval. `on_update` sees every
/// pending status and may stop the loop, which yields [`ClientError::Cancelled`].
pub async fn poll_document_status<S, C, F>(
    source: &S,
    sleeper: &C,
    document_id: &str,
    config: &PollConfig,
    mut on_update: F,
) -> Result<PollOutcome, ClientError>
where
    S: StatusSource + ?Sized,
    C: Sleeper + ?Sized,
    F: FnMut(&PollUpdate) -> ControlFlow<()>,
{
    let started = sleeper.now();
    let mut interval = config.interval;
    let mut attempt = 0;

    loop {
        attempt += 1;

        match source.fetch_status(document_id).await {
            Ok(report) => match report.class() {
                StatusClass::Completed => {
                    tracing::info!(document_id, attempts = attempt, "Document processing completed");
                    return Ok(PollOutcome {
                        success: true,
                        status: "completed".to_string(),
                        progress: 100,
                        attempts: attempt,
                        elapsed: sleeper.now() - started,
                    });
                }
                StatusClass::Failed => {
                    let message = report.failure_message();
                    tracing::error!(document_id, status = %report.status, error = %message, "Document processing failed");
                    return Err(ClientError::Processing(message));
                }
                class => {
                    tracing::debug!(document_id, attempt, status = %report.status, progress = ?report.progress, "Document still processing");
                    let update = PollUpdate {
                        attempt,
                        class,
                        progress: report.progress,
                    };
                    if on_update(&update).is_break() {
                        tracing::info!(document_id, attempt, "Polling stopped");
                        return Err(ClientError::Cancelled);
                    }
                    interval = config.next_interval(interval, report.progress);
                }
            },
            Err(e) if e.is_transient() => {
                tracing::warn!(document_id, attempt, error = %e, "Status check failed, retrying");
                interval = config.interval;
            }
            Err(e) => {
                tracing::error!(document_id, attempt, error = %e, "Status check failed");
                return Err(e);
            }
        }

        if attempt >= config.max_attempts {
            let elapsed = sleeper.now() - started;
            tracing::error!(document_id, attempts = attempt, elapsed = ?elapsed, "Document processing timed out");
            return Err(ClientError::Timeout {
                attempts: attempt,
                elapsed,
            });
        }

        sleeper.sleep(interval).await;
    }
}
