use async_trait::async_trait;

use crate::domain::DocumentAnalysis;

/// Layout analysis of a binary document. The call blocks until the
/// upstream operation reaches a terminal state; no partial result is
/// ever returned.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, data: &[u8]) -> Result<DocumentAnalysis, DocumentAnalyzerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentAnalyzerError {
    #[error("empty document")]
    EmptyDocument,
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
}
