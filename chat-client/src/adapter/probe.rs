//! Ordered field probes over response payloads.
//!
//! Each helper walks a fixed list of paths and returns the first hit; results
//! from different paths are never merged.

use crate::models::chat::{ChatMessage, Conversation, SourceChunk};
use crate::models::document::DocumentStatusReport;
use serde::de::DeserializeOwned;
use serde_json::Value;

const DOCUMENT_ID_PATHS: &[&str] = &[
    "documentId",
    "document_id",
    "data.documentId",
    "data.document_id",
    "data.data.documentId",
    "data.data.document_id",
    "document.id",
    "data.document.id",
    "data.data.document.id",
    "id",
    "data.id",
    "data.data.id",
];

const DOCUMENT_ID_KEYS: &[&str] = &["documentId", "document_id", "id"];

/// Objects that may carry a document's `status`, most specific first.
const STATUS_OBJECT_PATHS: &[&str] = &[
    "data.data",
    "data.document",
    "data.data.document",
    "document",
    "data",
    "",
];

const CONVERSATION_PATHS: &[&str] = &[
    "",
    "conversations",
    "data",
    "data.conversations",
    "data.data",
    "data.data.conversations",
];

const MESSAGE_PATHS: &[&str] = &[
    "",
    "messages",
    "data",
    "data.messages",
    "data.conversation.messages",
    "data.data",
    "data.data.messages",
    "data.data.conversation.messages",
];

const SEARCH_RESULT_PATHS: &[&str] = &[
    "",
    "results",
    "chunks",
    "data",
    "data.results",
    "data.chunks",
    "data.data",
    "data.data.results",
];

/// Follow a dotted path; the empty path is the value itself.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, key| current.get(key))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn find_id_recursive(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => DOCUMENT_ID_KEYS
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .or_else(|| map.values().find_map(find_id_recursive)),
        Value::Array(items) => items.iter().find_map(find_id_recursive),
        _ => None,
    }
}

/// Identifier of the document created by an upload.
pub fn extract_document_id(response: &Value) -> Option<String> {
    DOCUMENT_ID_PATHS
        .iter()
        .find_map(|path| lookup(response, path).and_then(id_string))
        .or_else(|| {
            let found = find_id_recursive(response);
            if found.is_some() {
                tracing::debug!("Document id found by recursive search");
            }
            found
        })
}

/// Status strings an envelope uses for the request outcome rather than the
/// document.
const ENVELOPE_STATUSES: &[&str] = &["success", "ok", "error", "fail", "failed"];

fn has_status(object: &Value) -> bool {
    object.get("status").and_then(Value::as_str).is_some()
}

/// The root wrapping a `data` object, or an outcome marker sitting beside a
/// nested object that carries its own status.
fn is_envelope(path: &str, object: &Value) -> bool {
    if path.is_empty() && object.get("data").is_some_and(Value::is_object) {
        return true;
    }

    let marker = object
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| ENVELOPE_STATUSES.contains(&s.trim().to_lowercase().as_str()));

    marker
        && ["data", "document"]
            .iter()
            .filter_map(|key| object.get(*key))
            .any(has_status)
}

fn string_field(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn progress_field(object: &Value) -> Option<u8> {
    ["processing_progress", "processingProgress", "progress"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
            _ => None,
        })
        .map(|p| p.clamp(0.0, 100.0).round() as u8)
}

/// Status, progress and error of a document from a status response.
pub fn extract_document_status(response: &Value) -> Option<DocumentStatusReport> {
    let object = STATUS_OBJECT_PATHS
        .iter()
        .filter_map(|path| lookup(response, path).map(|candidate| (*path, candidate)))
        .find(|(path, candidate)| has_status(candidate) && !is_envelope(path, candidate))
        .map(|(_, candidate)| candidate)?;

    let status = object.get("status").and_then(Value::as_str)?.to_string();

    Some(DocumentStatusReport {
        status,
        progress: progress_field(object),
        error: string_field(object, &["processing_error", "processingError", "error"]),
        message: string_field(object, &["message"]).or_else(|| string_field(response, &["message"])),
    })
}

fn extract_list<T: DeserializeOwned>(response: &Value, paths: &[&str], what: &str) -> Vec<T> {
    let Some(items) = paths
        .iter()
        .filter_map(|path| lookup(response, path))
        .find_map(Value::as_array)
    else {
        tracing::debug!(what, "No list found in response");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(what, error = %e, "Skipping undecodable item");
                None
            }
        })
        .collect()
}

pub fn extract_conversations_from_response(response: &Value) -> Vec<Conversation> {
    extract_list(response, CONVERSATION_PATHS, "conversations")
}

pub fn extract_messages_from_response(response: &Value) -> Vec<ChatMessage> {
    extract_list(response, MESSAGE_PATHS, "messages")
}

pub fn extract_search_results(response: &Value) -> Vec<SourceChunk> {
    extract_list(response, SEARCH_RESULT_PATHS, "search results")
}
