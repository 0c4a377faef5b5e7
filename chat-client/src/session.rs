//! Authentication session shared by every service.
//!
//! The session is hydrated from a [`TokenStore`] at start-up and cleared on
//! logout or whenever the API answers 401/403.

use crate::models::user::AuthUser;
use async_trait::async_trait;
use chat_core::ClientError;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Persisted form of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError>;
    async fn save(&self, session: &StoredSession) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
}

/// Stores the session as JSON in a file (default `.docchat/token`).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string(session)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            session: Mutex::new(Some(StoredSession {
                token: token.into(),
                user: None,
            })),
        }
    }

    pub fn snapshot(&self) -> Option<StoredSession> {
        self.session.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| ClientError::Storage(anyhow::anyhow!("token store poisoned")))?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| ClientError::Storage(anyhow::anyhow!("token store poisoned")))?;
        *guard = None;
        Ok(())
    }
}

struct SessionState {
    token: Secret<String>,
    user: Option<AuthUser>,
}

pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    state: RwLock<Option<SessionState>>,
}

impl AuthSession {
    /// Create an empty session backed by `store`.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            state: RwLock::new(None),
        }
    }

    /// Create a session and hydrate it from `store`.
    pub async fn init(store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let session = Self::new(store);
        session.hydrate().await?;
        Ok(session)
    }

    /// Reload the persisted session. Returns whether a token was found.
    pub async fn hydrate(&self) -> Result<bool, ClientError> {
        let stored = self.store.load().await?;
        let found = stored.is_some();

        *self.state.write().await = stored.map(|s| SessionState {
            token: Secret::new(s.token),
            user: s.user,
        });

        tracing::debug!(authenticated = found, "Session hydrated");
        Ok(found)
    }

    /// Record a freshly issued token and persist it.
    pub async fn establish(
        &self,
        token: String,
        user: Option<AuthUser>,
    ) -> Result<(), ClientError> {
        self.store
            .save(&StoredSession {
                token: token.clone(),
                user: user.clone(),
            })
            .await?;

        *self.state.write().await = Some(SessionState {
            token: Secret::new(token),
            user,
        });
        Ok(())
    }

    pub async fn token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.token.expose_secret().clone())
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.state.read().await.as_ref().and_then(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Forget the token in memory and in the store.
    pub async fn clear(&self) -> Result<(), ClientError> {
        *self.state.write().await = None;
        self.store.clear().await
    }
}
