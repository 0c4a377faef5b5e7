use super::ResponseStatus;
use chat_core::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A failed HTTP exchange, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    Status { code: u16, body: Option<Value> },
    /// The request never produced a response.
    Network(String),
}

/// Normalized error descriptor: `{status: "error", notFound?, code?, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFailure {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn server_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("data").and_then(|d| d.get("message")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a transport failure onto the normalized error descriptor.
///
/// A 404 always yields `{notFound: true, code: 404}` whatever the body says.
pub fn parse_api_error(error: &TransportError) -> ApiFailure {
    match error {
        TransportError::Status { code: 404, .. } => ApiFailure {
            status: ResponseStatus::Error,
            not_found: true,
            code: Some(404),
            message: None,
        },
        TransportError::Status { code, body } => {
            let message = body.as_ref().and_then(server_message).unwrap_or_else(|| {
                if *code >= 500 {
                    "Internal server error".to_string()
                } else {
                    format!("Request failed with status {}", code)
                }
            });
            ApiFailure {
                status: ResponseStatus::Error,
                not_found: false,
                code: Some(*code),
                message: Some(message),
            }
        }
        TransportError::Network(message) => {
            let message = if message.trim().is_empty() {
                "Network error".to_string()
            } else {
                message.clone()
            };
            ApiFailure {
                status: ResponseStatus::Error,
                not_found: false,
                code: None,
                message: Some(message),
            }
        }
    }
}

impl From<ApiFailure> for ClientError {
    fn from(failure: ApiFailure) -> Self {
        let message = failure.message.unwrap_or_default();
        match failure.code {
            _ if failure.not_found => ClientError::NotFound(if message.is_empty() {
                "Resource not found".to_string()
            } else {
                message
            }),
            Some(401) | Some(403) => ClientError::Unauthorized(message),
            Some(code) if code >= 500 => ClientError::Server { code, message },
            Some(code) => ClientError::Http { code, message },
            None => ClientError::Network(message),
        }
    }
}
