use std::sync::Arc;

use crate::application::ports::{
    ChatClient, ChatClientError, DocumentAnalyzer, DocumentAnalyzerError,
};
use crate::application::services::prompts;
use crate::domain::{Category, Page};

/// Orchestrates one structure-analysis request: layout analysis, prompt
/// construction, structured classification, response assembly.
pub struct StructureService<D, C>
where
    D: DocumentAnalyzer,
    C: ChatClient,
{
    analyzer: Arc<D>,
    chat_client: Arc<C>,
    classification_model: String,
}

impl<D, C> StructureService<D, C>
where
    D: DocumentAnalyzer,
    C: ChatClient,
{
    pub fn new(analyzer: Arc<D>, chat_client: Arc<C>, classification_model: String) -> Self {
        Self {
            analyzer,
            chat_client,
            classification_model,
        }
    }

    pub async fn analyze_structure(
        &self,
        classification_instruction: &str,
        document: &[u8],
    ) -> Result<DocumentStructure, StructureError> {
        let analysis = self.analyzer.analyze(document).await?;

        tracing::debug!(
            pages = analysis.pages.len(),
            markdown_bytes = analysis.content_markdown.len(),
            "Document analysis complete"
        );

        let system_prompt = prompts::classification_system_prompt(classification_instruction);
        let user_prompt =
            prompts::classification_user_prompt(&analysis.content_markdown, &analysis.pages);

        let categories = self
            .chat_client
            .classify(&system_prompt, &user_prompt, &self.classification_model)
            .await
            .map_err(StructureError::Classification)?;

        tracing::info!(categories = categories.len(), "Classification complete");

        Ok(DocumentStructure {
            categories,
            content_markdown: prompts::escape_markdown(&analysis.content_markdown),
            pages: analysis.pages,
        })
    }
}

/// Full result of a structure-analysis request. `content_markdown` is
/// already HTML-escaped; `pages` are verbatim from the analyzer. The
/// client later slices `pages` by a category's page numbers and submits
/// them back for extraction.
#[derive(Debug, Clone)]
pub struct DocumentStructure {
    pub categories: Vec<Category>,
    pub content_markdown: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("document analysis failed: {0}")]
    Analysis(#[from] DocumentAnalyzerError),
    #[error("classification failed: {0}")]
    Classification(ChatClientError),
}
