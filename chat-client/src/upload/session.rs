//! Observable state of one upload-and-process run.

use chat_core::time::Sleeper;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Analyzing,
    Completed,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, UploadStatus::Uploading | UploadStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct UploadSession {
    /// Bumped whenever a run starts or is cancelled. Only the run carrying the
    /// current generation is shown.
    pub generation: u64,
    pub file: Option<String>,
    pub conversation_id: Option<String>,
    pub document_id: Option<String>,
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
}

impl UploadSession {
    fn idle(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }
}

/// Holds the most recently started [`UploadSession`] and publishes every
/// change to subscribers.
///
/// Starting a run only takes over the displayed session: older runs keep
/// going and their updates are no longer shown. A run stops only after
/// [`cancel`](Self::cancel).
#[derive(Clone)]
pub struct UploadTracker {
    state: Arc<watch::Sender<UploadSession>>,
    /// Highest generation that has been cancelled.
    cancelled_through: Arc<AtomicU64>,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UploadSession::default());
        Self {
            state: Arc::new(state),
            cancelled_through: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn snapshot(&self) -> UploadSession {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSession> {
        self.state.subscribe()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.state.borrow().generation == generation
    }

    pub fn is_cancelled(&self, generation: u64) -> bool {
        generation <= self.cancelled_through.load(Ordering::Acquire)
    }

    /// Start a new run: `uploading` at 10%. Returns the run's generation.
    pub fn begin(&self, filename: &str, conversation_id: &str) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|session| {
            generation = session.generation + 1;
            *session = UploadSession {
                generation,
                file: Some(filename.to_string()),
                conversation_id: Some(conversation_id.to_string()),
                document_id: None,
                status: UploadStatus::Uploading,
                progress: 10,
                error: None,
            };
        });
        generation
    }

    /// Apply `update` when `generation` is the displayed run. Returns whether
    /// the run may continue, i.e. it has not been cancelled.
    fn update(&self, generation: u64, update: impl FnOnce(&mut UploadSession)) -> bool {
        let mut alive = false;
        self.state.send_if_modified(|session| {
            alive = !self.is_cancelled(generation);
            if !alive || session.generation != generation {
                return false;
            }
            update(session);
            true
        });
        alive
    }

    pub fn uploaded(&self, generation: u64, document_id: &str) -> bool {
        self.update(generation, |session| {
            session.document_id = Some(document_id.to_string());
            session.status = UploadStatus::Processing;
            session.progress = 40;
        })
    }

    pub fn progress(&self, generation: u64, status: UploadStatus, progress: u8) -> bool {
        self.update(generation, |session| {
            session.status = status;
            session.progress = progress.min(99);
        })
    }

    pub fn complete(&self, generation: u64) -> bool {
        self.update(generation, |session| {
            session.status = UploadStatus::Completed;
            session.progress = 100;
            session.error = None;
        })
    }

    pub fn fail(&self, generation: u64, message: &str) -> bool {
        self.update(generation, |session| {
            session.status = UploadStatus::Error;
            session.error = Some(message.to_string());
        })
    }

    /// Record a failure that happened before any run started.
    pub fn reject(&self, message: &str) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|session| {
            generation = session.generation + 1;
            *session = UploadSession {
                generation,
                status: UploadStatus::Error,
                error: Some(message.to_string()),
                ..Default::default()
            };
        });
        generation
    }

    /// Back to idle, only from `uploading` or `processing`. Stops the
    /// displayed run and every run started before it.
    ///
    /// Requests already in flight are not aborted; their later updates are
    /// ignored.
    pub fn cancel(&self) -> bool {
        let cancelled = self.state.send_if_modified(|session| {
            if !session.status.is_cancellable() {
                return false;
            }
            self.cancelled_through
                .fetch_max(session.generation, Ordering::AcqRel);
            *session = UploadSession::idle(session.generation + 1);
            true
        });
        if cancelled {
            tracing::info!("Upload cancelled, in-flight requests are left to finish");
        }
        cancelled
    }

    /// Return to idle after `grace` unless a newer run has started meanwhile.
    pub fn reset_after(&self, generation: u64, grace: Duration, sleeper: Arc<dyn Sleeper>) {
        let tracker = self.clone();
        tokio::spawn(async move {
            sleeper.sleep(grace).await;
            tracker.state.send_if_modified(|session| {
                if session.generation != generation || !session.status.is_terminal() {
                    return false;
                }
                *session = UploadSession::idle(generation);
                true
            });
        });
    }
}
