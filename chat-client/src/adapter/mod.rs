//! Response adapter.
//!
//! The backend wraps payloads in several envelope shapes. [`normalize`]
//! decodes a transport-level response into one tagged [`Normalized`] value,
//! and the probes in [`probe`] locate well-known fields inside payloads.

pub mod errors;
pub mod probe;

pub use errors::{ApiFailure, TransportError, parse_api_error};
pub use probe::{
    extract_conversations_from_response, extract_document_id, extract_document_status,
    extract_messages_from_response, extract_search_results, lookup,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    fn from_value(value: &Value) -> Self {
        match value.as_str().map(|s| s.trim().to_lowercase()) {
            Some(s) if matches!(s.as_str(), "error" | "fail" | "failed") => ResponseStatus::Error,
            _ => ResponseStatus::Success,
        }
    }
}

/// Canonical response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub status: ResponseStatus,
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NormalizedResponse {
    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}

/// Result of decoding an envelope. Inputs that are not reshaped are kept
/// untouched and tagged with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Canonical(NormalizedResponse),
    /// Already an error descriptor (`notFound` / `code`).
    ErrorDescriptor(Value),
    /// No `data` field; already normalized or opaque.
    Opaque(Value),
    /// `data` present but no recognizable status.
    Unrecognized(Value),
}

impl Normalized {
    pub fn kind(&self) -> &'static str {
        match self {
            Normalized::Canonical(_) => "canonical",
            Normalized::ErrorDescriptor(_) => "error_descriptor",
            Normalized::Opaque(_) => "opaque",
            Normalized::Unrecognized(_) => "unrecognized",
        }
    }

    pub fn canonical(&self) -> Option<&NormalizedResponse> {
        match self {
            Normalized::Canonical(response) => Some(response),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Normalized::Canonical(response) => response.is_error(),
            Normalized::ErrorDescriptor(_) => true,
            _ => false,
        }
    }

    /// The JSON form of the result: the canonical object, or the untouched input.
    pub fn into_value(self) -> Value {
        match self {
            Normalized::Canonical(response) => {
                serde_json::to_value(response).unwrap_or(Value::Null)
            }
            Normalized::ErrorDescriptor(value)
            | Normalized::Opaque(value)
            | Normalized::Unrecognized(value) => value,
        }
    }
}

/// JavaScript-style truthiness, used where the backend contract is "present
/// and non-empty".
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// Strip nested `{status, data}` wrappers so canonical data never carries one.
fn unwrap_nested(mut data: Value) -> Value {
    loop {
        let inner = match &data {
            Value::Object(map)
                if map.get("status").is_some_and(is_truthy)
                    && map.get("data").is_some_and(is_truthy) =>
            {
                map.get("data").cloned()
            }
            _ => None,
        };
        match inner {
            Some(inner) => data = inner,
            None => return data,
        }
    }
}

/// Decode a transport-level response (`{data: body, ...}`) into the canonical
/// shape. Rules are tried in order and the first match wins.
pub fn normalize(raw: &Value) -> Normalized {
    if !is_truthy(raw) {
        return Normalized::Canonical(NormalizedResponse {
            status: ResponseStatus::Error,
            data: None,
            message: Some("empty response".to_string()),
        });
    }

    if truthy_field(raw, "notFound").is_some() || truthy_field(raw, "code").is_some() {
        return Normalized::ErrorDescriptor(raw.clone());
    }

    let Some(body) = truthy_field(raw, "data") else {
        return Normalized::Opaque(raw.clone());
    };

    let status = truthy_field(body, "status");
    let nested = truthy_field(body, "data");

    match (status, nested) {
        (Some(status), Some(nested)) => Normalized::Canonical(NormalizedResponse {
            status: ResponseStatus::from_value(status),
            data: Some(unwrap_nested(nested.clone())),
            message: None,
        }),
        (Some(status), None) => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            let rest: Map<String, Value> = body
                .as_object()
                .map(|map| {
                    map.iter()
                        .filter(|(key, _)| key.as_str() != "status" && key.as_str() != "message")
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default();

            Normalized::Canonical(NormalizedResponse {
                status: ResponseStatus::from_value(status),
                data: Some(Value::Object(rest)),
                message,
            })
        }
        _ => {
            tracing::warn!(
                keys = ?body.as_object().map(|m| m.keys().cloned().collect::<Vec<_>>()),
                "Unrecognized response envelope, passing through"
            );
            Normalized::Unrecognized(raw.clone())
        }
    }
}
