use crate::adapter::lookup;
use crate::models::user::{AuthUser, LoginRequest, RegisterRequest};
use crate::services::api_client::ApiClient;
use chat_core::ClientError;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

const TOKEN_PATHS: &[&str] = &["data.token", "token", "data.data.token", "data.accessToken", "accessToken"];
const USER_PATHS: &[&str] = &["data.user", "user", "data.data.user"];

pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Option<AuthUser>, ClientError> {
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let response = self.api.post("/auth/login", request).await?;
        let user = self.establish(&response.body).await?;

        tracing::info!(email = %request.email, "Logged in");
        Ok(user)
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<Option<AuthUser>, ClientError> {
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let response = self.api.post("/auth/register", request).await?;
        let user = self.establish(&response.body).await?;

        tracing::info!(email = %request.email, "Registered");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.api.session().clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.api.session().user().await
    }

    async fn establish(&self, body: &Value) -> Result<Option<AuthUser>, ClientError> {
        let token = TOKEN_PATHS
            .iter()
            .filter_map(|path| lookup(body, path))
            .filter_map(Value::as_str)
            .find(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Decode("No token in authentication response".to_string()))?
            .to_string();

        let user = USER_PATHS
            .iter()
            .filter_map(|path| lookup(body, path))
            .find_map(|value| serde_json::from_value::<AuthUser>(value.clone()).ok());

        self.api.session().establish(token, user.clone()).await?;
        Ok(user)
    }
}
