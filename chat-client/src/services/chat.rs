//! Conversations and messages.

use crate::adapter::{
    extract_conversations_from_response, extract_messages_from_response, lookup,
};
use crate::models::chat::{
    ChatMessage, Conversation, NewConversation, Role, SendMessageRequest, SourceChunk,
};
use crate::services::api_client::ApiClient;
use chat_core::ClientError;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub struct ChatService {
    api: Arc<ApiClient>,
}

fn conversation_path(conversation_id: &str) -> Result<String, ClientError> {
    if conversation_id.trim().is_empty() {
        return Err(ClientError::Validation(
            "Conversation id is required".to_string(),
        ));
    }
    Ok(format!("/chat/conversations/{}", conversation_id))
}

/// Decode the first object found at `paths` as `T`.
fn decode_at<T: serde::de::DeserializeOwned>(body: &Value, paths: &[&str]) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(body, path))
        .find_map(|value| serde_json::from_value(value.clone()).ok())
}

impl ChatService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        let response = self.api.get("/chat/conversations").await?;
        Ok(extract_conversations_from_response(&response.body))
    }

    pub async fn create_conversation(&self, title: &str) -> Result<Conversation, ClientError> {
        let request = NewConversation {
            title: title.to_string(),
        };
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let response = self.api.post("/chat/conversations", &request).await?;
        let conversation: Conversation = decode_at(
            &response.body,
            &["data.conversation", "data.data", "data", "conversation", ""],
        )
        .ok_or_else(|| ClientError::Decode("No conversation in response".to_string()))?;

        tracing::info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    /// Fetch one conversation. A missing conversation surfaces as
    /// [`ClientError::NotFound`] so callers can fall back to a new chat.
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ClientError> {
        let response = self.api.get(&conversation_path(conversation_id)?).await?;
        decode_at(
            &response.body,
            &["data.conversation", "data.data", "data", "conversation", ""],
        )
        .ok_or_else(|| ClientError::Decode("No conversation in response".to_string()))
    }

    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), ClientError> {
        let request = NewConversation {
            title: title.to_string(),
        };
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        self.api
            .patch(&conversation_path(conversation_id)?, &request)
            .await?;
        Ok(())
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError> {
        self.api.delete(&conversation_path(conversation_id)?).await?;
        tracing::info!(conversation_id, "Conversation deleted");
        Ok(())
    }

    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, ClientError> {
        let path = format!("{}/messages", conversation_path(conversation_id)?);
        let response = self.api.get(&path).await?;
        Ok(extract_messages_from_response(&response.body))
    }

    /// Send a user message and return the assistant's reply.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<ChatMessage, ClientError> {
        let request = SendMessageRequest {
            content: content.to_string(),
        };
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let path = format!("{}/messages", conversation_path(conversation_id)?);
        let response = self.api.post(&path, &request).await?;

        assistant_reply(&response.body)
            .ok_or_else(|| ClientError::Decode("No assistant message in response".to_string()))
    }
}

/// Locate the assistant reply. Sources may sit next to the message instead
/// of inside it.
fn assistant_reply(body: &Value) -> Option<ChatMessage> {
    const MESSAGE_PATHS: &[&str] = &[
        "data.assistantMessage",
        "data.data.assistantMessage",
        "assistantMessage",
        "data.message",
        "data.data.message",
        "message",
        "data.data",
        "data",
        "",
    ];

    let mut message: ChatMessage = MESSAGE_PATHS
        .iter()
        .filter_map(|path| lookup(body, path))
        .filter(|value| value.is_object())
        .find_map(|value| serde_json::from_value::<ChatMessage>(value.clone()).ok())
        .or_else(|| {
            // Some deployments answer with a bare `response` string.
            ["data.response", "response", "data.data.response"]
                .iter()
                .filter_map(|path| lookup(body, path))
                .find_map(Value::as_str)
                .map(|text| ChatMessage {
                    id: None,
                    role: Role::Assistant,
                    content: text.to_string(),
                    created_at: None,
                    sources: Vec::new(),
                })
        })?;

    if message.sources.is_empty() {
        message.sources = decode_at::<Vec<SourceChunk>>(
            body,
            &["data.sources", "sources", "data.data.sources"],
        )
        .unwrap_or_default();
    }

    Some(message)
}
