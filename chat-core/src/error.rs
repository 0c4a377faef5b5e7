use std::time::Duration;
use thiserror::Error;

/// Error taxonomy shared by every client-side operation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({code}): {message}")]
    Server { code: u16, message: String },

    #[error("Request failed ({code}): {message}")]
    Http { code: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Timed out after {attempts} attempts ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Document processor unavailable: {0}")]
    ProcessorUnavailable(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("No document identifier in upload response")]
    MissingDocumentId,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

impl ClientError {
    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::NotFound(_) => Some(404),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Server { code, .. } | ClientError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Whether a repeated attempt of the same request may succeed.
    ///
    /// Polling loops keep going on transient errors and stop on anything else.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_)
                | ClientError::Server { .. }
                | ClientError::Http { .. }
                | ClientError::Decode(_)
                | ClientError::NotFound(_)
        )
    }

    /// Message suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotFound(_) => {
                "The requested item no longer exists. Start a new conversation.".to_string()
            }
            ClientError::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            ClientError::Server { .. } => "The server encountered an error. Try again later.".to_string(),
            ClientError::Timeout { .. } => {
                "Document processing is taking longer than expected.".to_string()
            }
            ClientError::Network(_) => "Could not reach the server.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) if status.is_server_error() => ClientError::Server {
                code: status.as_u16(),
                message: err.to_string(),
            },
            Some(status) => ClientError::Http {
                code: status.as_u16(),
                message: err.to_string(),
            },
            None => ClientError::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Network("reset".into()).is_transient());
        assert!(ClientError::Server {
            code: 503,
            message: "down".into()
        }
        .is_transient());
        assert!(!ClientError::Unauthorized("expired".into()).is_transient());
        assert!(!ClientError::Processing("bad pdf".into()).is_transient());
        assert!(!ClientError::Validation("no file".into()).is_transient());
    }

    #[test]
    fn test_status_code() {
        assert_eq!(ClientError::NotFound("x".into()).status_code(), Some(404));
        assert_eq!(
            ClientError::Http {
                code: 422,
                message: "bad".into()
            }
            .status_code(),
            Some(422)
        );
        assert_eq!(ClientError::MissingDocumentId.status_code(), None);
    }

    #[test]
    fn test_user_message_for_not_found_offers_new_conversation() {
        let msg = ClientError::NotFound("conversation".into()).user_message();
        assert!(msg.contains("new conversation"));
    }
}
