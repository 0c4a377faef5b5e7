use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<String>,
}

impl Conversation {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("New conversation")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "bot", alias = "ai")]
    Assistant,
    System,
}

/// A retrieved document fragment shown as a RAG source under an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceChunk {
    #[serde(default, alias = "documentId")]
    pub document_id: Option<String>,
    #[serde(default, alias = "documentName", alias = "filename")]
    pub document_name: Option<String>,
    #[serde(default, alias = "text")]
    pub content: String,
    #[serde(default, alias = "similarity")]
    pub score: Option<f64>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceChunk>,
}

#[derive(Debug, Serialize, Validate)]
pub struct NewConversation {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

#[derive(Debug, Serialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_decodes_backend_aliases() {
        let message: ChatMessage = serde_json::from_value(json!({
            "_id": "m1",
            "role": "bot",
            "content": "Olá",
            "createdAt": "2024-01-01T00:00:00Z",
            "sources": [{"documentName": "relatorio.pdf", "text": "trecho", "similarity": 0.91}]
        }))
        .unwrap();

        assert_eq!(message.id.as_deref(), Some("m1"));
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.sources[0].document_name.as_deref(), Some("relatorio.pdf"));
        assert_eq!(message.sources[0].score, Some(0.91));
    }

    #[test]
    fn test_conversation_title_fallback() {
        let conversation: Conversation = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(conversation.display_title(), "New conversation");
    }
}
