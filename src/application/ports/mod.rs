mod chat_client;
mod document_analyzer;

pub use chat_client::{ChatClient, ChatClientError};
pub use document_analyzer::{DocumentAnalyzer, DocumentAnalyzerError};
