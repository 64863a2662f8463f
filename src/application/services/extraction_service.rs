use std::sync::Arc;

use crate::application::ports::{ChatClient, ChatClientError};
use crate::application::services::prompts;
use crate::domain::{Category, Page};

/// Orchestrates one category-extraction request: per-page context
/// building, prompt construction, freeform extraction, response
/// assembly.
pub struct ExtractionService<C>
where
    C: ChatClient,
{
    chat_client: Arc<C>,
    extraction_model: String,
}

impl<C> ExtractionService<C>
where
    C: ChatClient,
{
    pub fn new(chat_client: Arc<C>, extraction_model: String) -> Self {
        Self {
            chat_client,
            extraction_model,
        }
    }

    pub async fn extract_category(
        &self,
        target_category: &Category,
        categories: &[Category],
        content_markdown: &str,
        pages: &[Page],
    ) -> Result<CategoryExtraction, ExtractionError> {
        let contexts = prompts::page_contexts(pages);

        let system_prompt =
            prompts::extraction_system_prompt(categories, content_markdown, &contexts)?;
        let user_prompt = prompts::extraction_user_prompt(target_category)?;

        // Multimodal extraction is not wired up yet, so no image URLs
        // are passed; /capabilities reports page_image_export=false.
        let content = self
            .chat_client
            .extract(&system_prompt, &user_prompt, &[], &self.extraction_model)
            .await
            .map_err(ExtractionError::Extraction)?;

        tracing::info!(
            category = %target_category.category,
            content_bytes = content.len(),
            "Extraction complete"
        );

        let pages = target_category
            .page_numbers
            .iter()
            .map(|&page_number| ExtractionPage {
                page_number,
                save_as_image: false,
            })
            .collect();

        Ok(CategoryExtraction {
            category: target_category.category.clone(),
            pages,
            content,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CategoryExtraction {
    pub category: String,
    pub pages: Vec<ExtractionPage>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPage {
    pub page_number: u32,
    pub save_as_image: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("prompt serialization failed: {0}")]
    PromptSerialization(#[from] serde_json::Error),
    #[error("extraction failed: {0}")]
    Extraction(ChatClientError),
}
