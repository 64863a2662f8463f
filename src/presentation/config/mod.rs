mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DocumentIntelligenceSettings, OpenAiSettings, ServerSettings, Settings, SettingsError,
    DEFAULT_API_VERSION, DEFAULT_CLASSIFICATION_MODEL, DEFAULT_EXTRACTION_MODEL,
};
