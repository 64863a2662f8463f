use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatClient, ChatClientError, DocumentAnalyzer};
use crate::application::services::StructureError;
use crate::domain::{Category, Page};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::handlers::{ErrorCode, ErrorResponse};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct AnalyzeDocumentRequest {
    pub classification_prompt: Option<String>,
    pub pdf_binary: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentStructureResponse {
    pub categories: Vec<Category>,
    pub content_markdown: String,
    pub pages: Vec<Page>,
}

/// `POST /analyze_document_structure`: decode the uploaded PDF, run
/// layout analysis, classify the content, and return the full document
/// structure.
#[tracing::instrument(skip(state, payload))]
pub async fn analyze_document_structure_handler<D, C>(
    State(state): State<AppState<D, C>>,
    payload: Result<Json<AnalyzeDocumentRequest>, JsonRejection>,
) -> Response
where
    D: DocumentAnalyzer + 'static,
    C: ChatClient + 'static,
{
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Malformed request body");
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

    let classification_prompt = request.classification_prompt.unwrap_or_default();
    let pdf_binary = request.pdf_binary.unwrap_or_default();

    if classification_prompt.trim().is_empty() || pdf_binary.is_empty() {
        tracing::warn!("Request missing classification_prompt or pdf_binary");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                ErrorCode::InvalidRequest,
                "Missing required fields in request body.",
            )),
        )
            .into_response();
    }

    tracing::debug!(
        instruction = %sanitize_prompt(&classification_prompt),
        "Processing analyze_document_structure request"
    );

    let document = match general_purpose::STANDARD.decode(&pdf_binary) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "pdf_binary is not valid base64");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    ErrorCode::InvalidRequest,
                    format!("pdf_binary is not valid base64: {e}"),
                )),
            )
                .into_response();
        }
    };

    let structure = match state
        .structure_service
        .analyze_structure(&classification_prompt, &document)
        .await
    {
        Ok(structure) => structure,
        Err(StructureError::Classification(ChatClientError::RateLimited)) => {
            tracing::error!("Classification rate limited");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new(
                    ErrorCode::RateLimited,
                    "Rate limit exceeded. Please try again later.",
                )),
            )
                .into_response();
        }
        Err(StructureError::Classification(e)) => {
            tracing::error!(error = %e, "Classification failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    ErrorCode::UpstreamFailure,
                    format!("Error during chat completion call: {e}"),
                )),
            )
                .into_response();
        }
        Err(StructureError::Analysis(e)) => {
            tracing::error!(error = %e, "Document analysis failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    ErrorCode::UpstreamFailure,
                    format!("Error analyzing document structure: {e}"),
                )),
            )
                .into_response();
        }
    };

    let response = DocumentStructureResponse {
        categories: structure.categories,
        content_markdown: structure.content_markdown,
        pages: structure.pages,
    };

    // serde_json keeps non-ASCII characters as-is, so Japanese text in
    // the body is not escaped to \uXXXX sequences.
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
