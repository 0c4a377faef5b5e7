pub mod poll;
pub mod processor;
pub mod session;

pub use poll::{poll_document_status, PollConfig, PollOutcome, PollUpdate, StatusSource};
pub use processor::{DocumentProcessor, ProcessOutcome, ProcessedDocument};
pub use session::{UploadSession, UploadStatus, UploadTracker};
