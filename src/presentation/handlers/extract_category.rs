use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatClient, ChatClientError, DocumentAnalyzer};
use crate::application::services::ExtractionError;
use crate::domain::{Category, Page};
use crate::presentation::handlers::{ErrorCode, ErrorResponse};
use crate::presentation::state::AppState;

/// Request body for category extraction. `pages` is expected to be the
/// slice of the earlier structure-analysis response whose page numbers
/// belong to `target_category`; `categories` is the full set, included
/// for prompt context.
#[derive(Deserialize)]
pub struct ExtractionRequest {
    pub target_category: Category,
    pub categories: Vec<Category>,
    pub content_markdown: String,
    pub pages: Vec<Page>,
}

#[derive(Serialize)]
pub struct ExtractionResponse {
    pub category: String,
    pub pages: Vec<ExtractionPageResponse>,
    pub content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionPageResponse {
    pub page_number: u32,
    pub save_as_image: bool,
}

/// `POST /extraction_category`: extract the content belonging to one
/// category from the previously analyzed document.
#[tracing::instrument(skip(state, payload))]
pub async fn extraction_category_handler<D, C>(
    State(state): State<AppState<D, C>>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Response
where
    D: DocumentAnalyzer + 'static,
    C: ChatClient + 'static,
{
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Request failed validation");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    ErrorCode::InvalidRequest,
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    tracing::debug!(
        category = %request.target_category.category,
        pages = request.pages.len(),
        "Processing extraction_category request"
    );

    let extraction = match state
        .extraction_service
        .extract_category(
            &request.target_category,
            &request.categories,
            &request.content_markdown,
            &request.pages,
        )
        .await
    {
        Ok(extraction) => extraction,
        Err(ExtractionError::Extraction(ChatClientError::RateLimited)) => {
            tracing::error!("Extraction rate limited");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new(
                    ErrorCode::RateLimited,
                    "Rate limit exceeded. Please try again later.",
                )),
            )
                .into_response();
        }
        Err(ExtractionError::Extraction(e)) => {
            tracing::error!(error = %e, "Extraction failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    ErrorCode::UpstreamFailure,
                    format!("Error during chat completion call: {e}"),
                )),
            )
                .into_response();
        }
        Err(ExtractionError::PromptSerialization(e)) => {
            tracing::error!(error = %e, "Prompt serialization failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    ErrorCode::SerializationFailure,
                    format!("Error serializing JSON: {e}"),
                )),
            )
                .into_response();
        }
    };

    let response = ExtractionResponse {
        category: extraction.category,
        pages: extraction
            .pages
            .into_iter()
            .map(|p| ExtractionPageResponse {
                page_number: p.page_number,
                save_as_image: p.save_as_image,
            })
            .collect(),
        content: extraction.content,
    };

    match serde_json::to_string(&response) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    ErrorCode::SerializationFailure,
                    format!("Error serializing JSON: {e}"),
                )),
            )
                .into_response()
        }
    }
}
