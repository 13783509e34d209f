use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(skip)]
    pub environment: Environment,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub transcription: TranscriptionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    /// Hub model id for the local provider (`openai/whisper-base`), API
    /// model name for the remote one.
    pub whisper_model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid TRANSCRIPTION_PROVIDER: {0}. Expected: local or openai")]
    InvalidProvider(String),
    #[error("{0}")]
    InvalidEnvironment(String),
}

impl Settings {
    /// Populate settings from environment variables. Unset numeric values
    /// fall back to defaults; an unparseable provider or environment is a
    /// hard error rather than a silent fallback.
    pub fn from_env() -> Result<Self, SettingsError> {
        let environment = match std::env::var("APP_ENV") {
            Ok(v) => Environment::try_from(v).map_err(SettingsError::InvalidEnvironment)?,
            Err(_) => Environment::Local,
        };

        let provider = match std::env::var("TRANSCRIPTION_PROVIDER") {
            Ok(v) => match v.to_lowercase().as_str() {
                "local" => TranscriptionProviderSetting::Local,
                "openai" => TranscriptionProviderSetting::OpenAi,
                _ => return Err(SettingsError::InvalidProvider(v)),
            },
            Err(_) => TranscriptionProviderSetting::Local,
        };

        Ok(Self {
            environment,
            server: ServerSettings {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8000),
                max_upload_size_mb: std::env::var("MAX_UPLOAD_SIZE_MB")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100),
            },
            logging: LoggingSettings {
                level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                enable_json: std::env::var("LOG_FORMAT")
                    .map(|v| v.to_lowercase() == "json")
                    .unwrap_or(false),
            },
            transcription: TranscriptionSettings {
                provider,
                whisper_model: std::env::var("WHISPER_MODEL")
                    .unwrap_or_else(|_| "openai/whisper-base".to_string()),
                api_key: std::env::var("OPENAI_API_KEY").ok(),
                base_url: std::env::var("OPENAI_BASE_URL").ok(),
            },
        })
    }
}
