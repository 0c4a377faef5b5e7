use crate::upload::PollConfig;
use chat_core::config::load_settings;
use chat_core::ClientError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the chat API, including the `/api` prefix.
    pub url: String,
    /// Document processor host, probed directly when the API health route fails.
    pub processor_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5002/api".to_string(),
            processor_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
    /// Reported progress above which the interval starts halving.
    pub fast_threshold: u8,
    pub min_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 60,
            fast_threshold: 80,
            min_interval_ms: 500,
        }
    }
}

impl PollingSettings {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
            fast_threshold: self.fast_threshold,
            min_interval: Duration::from_millis(self.min_interval_ms),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UploadSettings {
    /// How long a completed or failed session stays visible before resetting.
    pub reset_grace_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            reset_grace_ms: 3000,
        }
    }
}

impl UploadSettings {
    pub fn reset_grace(&self) -> Duration {
        Duration::from_millis(self.reset_grace_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AuthSettings {
    pub token_path: PathBuf,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(".docchat/token"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            otlp_endpoint: None,
        }
    }
}

/// Load settings from `chat-client/config/base.yaml`, `APP_*` variables and
/// the plain `API_URL` / `PROCESSOR_URL` / `OTLP_ENDPOINT` overrides.
pub fn get_configuration() -> Result<Settings, ClientError> {
    load_settings(
        "chat-client",
        &[
            ("api.url", "API_URL"),
            ("api.processor_url", "PROCESSOR_URL"),
            ("logging.otlp_endpoint", "OTLP_ENDPOINT"),
        ],
    )
}
