pub mod api_client;
pub mod auth;
pub mod chat;
pub mod document_client;
