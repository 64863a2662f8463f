use crate::presentation::config::Environment;

/// Runtime settings, read once from the process environment at startup.
/// Service endpoints and keys have no defaults; model deployments and
/// timeouts do.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub document_intelligence: DocumentIntelligenceSettings,
    pub openai: OpenAiSettings,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DocumentIntelligenceSettings {
    pub endpoint: String,
    pub api_key: String,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub classification_model: String,
    pub extraction_model: String,
}

pub const DEFAULT_API_VERSION: &str = "2025-01-01-preview";
pub const DEFAULT_CLASSIFICATION_MODEL: &str = "gpt-4o";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o-mini";

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".to_string())
            .try_into()
            .map_err(SettingsError::InvalidValue)?;

        Ok(Self {
            server: ServerSettings {
                port: optional("SERVER_PORT")
                    .map(|p| p.parse())
                    .transpose()
                    .map_err(|e| SettingsError::InvalidValue(format!("SERVER_PORT: {e}")))?
                    .unwrap_or(3000),
            },
            document_intelligence: DocumentIntelligenceSettings {
                endpoint: required("DI_ENDPOINT")?,
                api_key: required("DI_KEY")?,
                poll_timeout_secs: optional("ANALYZE_POLL_TIMEOUT_SECS")
                    .map(|p| p.parse())
                    .transpose()
                    .map_err(|e| {
                        SettingsError::InvalidValue(format!("ANALYZE_POLL_TIMEOUT_SECS: {e}"))
                    })?
                    .unwrap_or(300),
            },
            openai: OpenAiSettings {
                endpoint: required("AZURE_OPENAI_ENDPOINT")?,
                api_key: required("AZURE_OPENAI_API_KEY")?,
                api_version: optional("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                classification_model: optional("CLASSIFICATION_MODEL")
                    .unwrap_or_else(|| DEFAULT_CLASSIFICATION_MODEL.to_string()),
                extraction_model: optional("EXTRACTION_MODEL")
                    .unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string()),
            },
            environment,
        })
    }
}

fn required(name: &'static str) -> Result<String, SettingsError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::MissingVar(name)),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid environment variable: {0}")]
    InvalidValue(String),
}
