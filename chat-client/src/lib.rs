pub mod adapter;
pub mod config;
pub mod extract;
pub mod models;
pub mod services;
pub mod session;
pub mod upload;

use config::Settings;
use services::{
    api_client::ApiClient, auth::AuthService, chat::ChatService, document_client::DocumentClient,
};
use session::AuthSession;
use std::sync::Arc;
use upload::DocumentProcessor;

pub use chat_core::ClientError;

/// Every service of the client wired to one shared session and HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<AuthSession>,
    pub api_client: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub chat: Arc<ChatService>,
    pub documents: Arc<DocumentClient>,
    pub processor: Arc<DocumentProcessor>,
}

impl AppState {
    pub fn new(settings: &Settings, session: Arc<AuthSession>) -> Result<Self, ClientError> {
        let api_client = Arc::new(ApiClient::new(settings.api.clone(), session.clone())?);
        let documents = Arc::new(DocumentClient::new(api_client.clone()));
        let processor = Arc::new(DocumentProcessor::new(
            documents.clone(),
            settings.polling.poll_config(),
            settings.upload.reset_grace(),
        ));

        Ok(Self {
            session,
            auth: Arc::new(AuthService::new(api_client.clone())),
            chat: Arc::new(ChatService::new(api_client.clone())),
            api_client,
            documents,
            processor,
        })
    }
}
