use async_trait::async_trait;

use crate::domain::Category;

/// Chat completion service with two calling modes.
///
/// `classify` is a structured-generation contract: the implementation
/// must request schema-conformant output and fail with
/// [`ChatClientError::InvalidResponse`] rather than accept malformed
/// output. `extract` returns freeform text; `image_urls` is reserved
/// for multimodal extraction and is not yet attached to any payload.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn classify(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
    ) -> Result<Vec<Category>, ChatClientError>;

    async fn extract(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_urls: &[String],
        model: &str,
    ) -> Result<String, ChatClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
