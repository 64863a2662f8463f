use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{ChatClient, ChatClientError};
use crate::domain::Category;

/// Azure OpenAI chat completions adapter. One deployment-scoped call
/// per request, no internal retries; a 429 from the service surfaces as
/// [`ChatClientError::RateLimited`] for the caller to handle.
pub struct AzureOpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureOpenAiClient {
    pub fn new(endpoint: &str, api_key: &str, api_version: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
        response_format: Option<serde_json::Value>,
    ) -> Result<String, ChatClientError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, model, self.api_version
        );

        let mut body = json!({
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text },
            ],
        });
        if let Some(format) = response_format {
            body["response_format"] = format;
        }

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatClientError::ApiRequestFailed(format!("request failed: {e}")))?;

        if response.status().as_u16() == 429 {
            return Err(ChatClientError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ChatClientError::ApiRequestFailed(format!(
                "completion returned {status}: {text}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ChatClientError::InvalidResponse(format!("response parse failed: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ChatClientError::InvalidResponse("completion carried no content".to_string())
            })
    }
}

#[async_trait]
impl ChatClient for AzureOpenAiClient {
    #[tracing::instrument(skip(self, system_prompt, user_text))]
    async fn classify(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
    ) -> Result<Vec<Category>, ChatClientError> {
        let content = self
            .complete(
                system_prompt,
                user_text,
                model,
                Some(category_list_response_format()),
            )
            .await?;

        let parsed: CategoryList = serde_json::from_str(&content).map_err(|e| {
            ChatClientError::InvalidResponse(format!("category list parse failed: {e}"))
        })?;

        Ok(parsed.categories)
    }

    #[tracing::instrument(skip(self, system_prompt, user_text, image_urls))]
    async fn extract(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_urls: &[String],
        model: &str,
    ) -> Result<String, ChatClientError> {
        if !image_urls.is_empty() {
            tracing::warn!(
                count = image_urls.len(),
                "Image URLs are not yet attached to the completion payload"
            );
        }

        self.complete(system_prompt, user_text, model, None).await
    }
}

/// Strict schema for the classification output. The service either
/// returns a conforming `{"categories": [...]}` object or the call
/// fails; malformed output is never passed through.
fn category_list_response_format() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "category_list",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "categories": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "category": { "type": "string" },
                                "page_numbers": {
                                    "type": "array",
                                    "items": { "type": "integer" }
                                }
                            },
                            "required": ["category", "page_numbers"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["categories"],
                "additionalProperties": false
            }
        }
    })
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}
