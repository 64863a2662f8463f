use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose, Engine as _};
use tower::ServiceExt;

use docustruct::application::ports::{
    ChatClient, ChatClientError, DocumentAnalyzer, DocumentAnalyzerError,
};
use docustruct::application::services::{ExtractionService, StructureService};
use docustruct::domain::{Category, DocumentAnalysis, Line, Page};
use docustruct::presentation::{create_router, AppState};

const TEST_CLASSIFICATION_MODEL: &str = "gpt-4o";
const TEST_EXTRACTION_MODEL: &str = "gpt-4o-mini";
const TEST_MARKDOWN: &str = "# Title <doc> & \"quotes\"\n\nIntro text\n\nBudget: $100";

fn make_page(page_number: u32, lines: &[&str]) -> Page {
    Page {
        page_number,
        width: 8.5,
        height: 11.0,
        lines: lines
            .iter()
            .map(|content| Line {
                content: content.to_string(),
                polygon: vec![],
                spans: vec![],
            })
            .collect(),
        tables: vec![],
        figures: vec![],
    }
}

struct MockAnalyzer;

#[async_trait]
impl DocumentAnalyzer for MockAnalyzer {
    async fn analyze(&self, data: &[u8]) -> Result<DocumentAnalysis, DocumentAnalyzerError> {
        if data.is_empty() {
            return Err(DocumentAnalyzerError::EmptyDocument);
        }
        Ok(DocumentAnalysis {
            content_markdown: TEST_MARKDOWN.to_string(),
            pages: vec![
                make_page(1, &["Intro text"]),
                make_page(2, &["Budget: $100"]),
            ],
        })
    }
}

struct FailingAnalyzer;

#[async_trait]
impl DocumentAnalyzer for FailingAnalyzer {
    async fn analyze(&self, _data: &[u8]) -> Result<DocumentAnalysis, DocumentAnalyzerError> {
        Err(DocumentAnalyzerError::AnalysisFailed(
            "submit returned 401: access denied".to_string(),
        ))
    }
}

/// Returns a fixed two-category classification and echoes extraction.
struct MockChatClient;

#[async_trait]
impl ChatClient for MockChatClient {
    async fn classify(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _model: &str,
    ) -> Result<Vec<Category>, ChatClientError> {
        Ok(vec![
            Category {
                category: "Intro".to_string(),
                page_numbers: vec![1],
            },
            Category {
                category: "Budget".to_string(),
                page_numbers: vec![2],
            },
        ])
    }

    async fn extract(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _image_urls: &[String],
        _model: &str,
    ) -> Result<String, ChatClientError> {
        Ok("Extracted content".to_string())
    }
}

struct RateLimitedChatClient;

#[async_trait]
impl ChatClient for RateLimitedChatClient {
    async fn classify(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _model: &str,
    ) -> Result<Vec<Category>, ChatClientError> {
        Err(ChatClientError::RateLimited)
    }

    async fn extract(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _image_urls: &[String],
        _model: &str,
    ) -> Result<String, ChatClientError> {
        Err(ChatClientError::RateLimited)
    }
}

struct FailingChatClient;

#[async_trait]
impl ChatClient for FailingChatClient {
    async fn classify(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _model: &str,
    ) -> Result<Vec<Category>, ChatClientError> {
        Err(ChatClientError::ApiRequestFailed(
            "completion returned 503: deployment offline".to_string(),
        ))
    }

    async fn extract(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _image_urls: &[String],
        _model: &str,
    ) -> Result<String, ChatClientError> {
        Err(ChatClientError::ApiRequestFailed(
            "completion returned 503: deployment offline".to_string(),
        ))
    }
}

/// Deliberately returns page numbers outside the analyzed document.
/// The subset contract is enforced by the classification prompt, not
/// by the code, so these must pass through untouched.
struct OutOfRangeChatClient;

#[async_trait]
impl ChatClient for OutOfRangeChatClient {
    async fn classify(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _model: &str,
    ) -> Result<Vec<Category>, ChatClientError> {
        Ok(vec![Category {
            category: "Phantom".to_string(),
            page_numbers: vec![99],
        }])
    }

    async fn extract(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _image_urls: &[String],
        _model: &str,
    ) -> Result<String, ChatClientError> {
        Ok(String::new())
    }
}

fn create_test_app<D, C>(analyzer: D, chat_client: C) -> axum::Router
where
    D: DocumentAnalyzer + 'static,
    C: ChatClient + 'static,
{
    let analyzer = Arc::new(analyzer);
    let chat_client = Arc::new(chat_client);

    let structure_service = Arc::new(StructureService::new(
        Arc::clone(&analyzer),
        Arc::clone(&chat_client),
        TEST_CLASSIFICATION_MODEL.to_string(),
    ));

    let extraction_service = Arc::new(ExtractionService::new(
        Arc::clone(&chat_client),
        TEST_EXTRACTION_MODEL.to_string(),
    ));

    create_router(AppState {
        structure_service,
        extraction_service,
    })
}

fn analyze_request_body() -> String {
    let pdf = general_purpose::STANDARD.encode(b"%PDF-1.4 fake document");
    format!(
        r#"{{"classification_prompt": "目次、予算", "pdf_binary": "{}"}}"#,
        pdf
    )
}

fn extraction_request_body() -> &'static str {
    r##"{
        "target_category": {"category": "Budget", "page_numbers": [2]},
        "categories": [
            {"category": "Intro", "page_numbers": [1]},
            {"category": "Budget", "page_numbers": [2]}
        ],
        "content_markdown": "# Title",
        "pages": [
            {"page_number": 2, "width": 8.5, "height": 11.0,
             "lines": [{"content": "Budget: $100"}]}
        ]
    }"##
}

async fn post_json(app: axum::Router, uri: &str, body: impl Into<Body>) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_no_image_support_when_capabilities_then_reports_false() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/capabilities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page_image_export"], false);
}

#[tokio::test]
async fn given_valid_document_when_analyzing_then_returns_structure() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["category"], "Intro");
    assert_eq!(categories[0]["page_numbers"], serde_json::json!([1]));
    assert_eq!(categories[1]["category"], "Budget");
    assert_eq!(categories[1]["page_numbers"], serde_json::json!([2]));

    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
    assert_eq!(json["pages"][0]["lines"][0]["content"], "Intro text");
    assert_eq!(json["pages"][1]["lines"][0]["content"], "Budget: $100");
}

#[tokio::test]
async fn given_valid_document_when_analyzing_then_markdown_is_html_escaped() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let markdown = json["content_markdown"].as_str().unwrap();
    assert!(markdown.contains("&lt;doc&gt;"));
    assert!(markdown.contains("&amp;"));
    assert!(markdown.contains("&quot;quotes&quot;"));
    assert_eq!(
        html_escape::decode_html_entities(markdown),
        TEST_MARKDOWN
    );
}

#[tokio::test]
async fn given_missing_pdf_binary_when_analyzing_then_returns_bad_request() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(
        app,
        "/analyze_document_structure",
        r#"{"classification_prompt": "目次"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(!json["error"].as_str().unwrap().is_empty());
    assert_eq!(json["code"], "invalid_request");
}

#[tokio::test]
async fn given_empty_classification_prompt_when_analyzing_then_returns_bad_request() {
    let app = create_test_app(MockAnalyzer, MockChatClient);
    let pdf = general_purpose::STANDARD.encode(b"%PDF-1.4");

    let response = post_json(
        app,
        "/analyze_document_structure",
        format!(r#"{{"classification_prompt": "", "pdf_binary": "{}"}}"#, pdf),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn given_invalid_base64_when_analyzing_then_returns_bad_request() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(
        app,
        "/analyze_document_structure",
        r#"{"classification_prompt": "目次", "pdf_binary": "not-base64!!"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "invalid_request");
}

#[tokio::test]
async fn given_analyzer_failure_when_analyzing_then_returns_server_error() {
    let app = create_test_app(FailingAnalyzer, MockChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("access denied"));
    assert_eq!(json["code"], "upstream_failure");
}

#[tokio::test]
async fn given_rate_limited_classifier_when_analyzing_then_returns_too_many_requests() {
    let app = create_test_app(MockAnalyzer, RateLimitedChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "rate_limited");
}

#[tokio::test]
async fn given_failing_classifier_when_analyzing_then_body_contains_error_detail() {
    let app = create_test_app(MockAnalyzer, FailingChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("deployment offline"));
}

#[tokio::test]
async fn given_out_of_range_page_numbers_when_analyzing_then_passed_through() {
    // Page-number validity is the classifier's contract (the prompt
    // forbids inventing numbers); the handler does not enforce it.
    let app = create_test_app(MockAnalyzer, OutOfRangeChatClient);

    let response = post_json(app, "/analyze_document_structure", analyze_request_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["categories"][0]["page_numbers"],
        serde_json::json!([99])
    );
}

#[tokio::test]
async fn given_valid_request_when_extracting_then_returns_content() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(app, "/extraction_category", extraction_request_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["category"], "Budget");
    assert_eq!(json["content"], "Extracted content");
}

#[tokio::test]
async fn given_target_category_when_extracting_then_one_page_entry_per_page_number() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let body = r##"{
        "target_category": {"category": "Appendix", "page_numbers": [3, 5, 8]},
        "categories": [{"category": "Appendix", "page_numbers": [3, 5, 8]}],
        "content_markdown": "# Title",
        "pages": []
    }"##;

    let response = post_json(app, "/extraction_category", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let pages = json["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    for (entry, expected) in pages.iter().zip([3, 5, 8]) {
        assert_eq!(entry["pageNumber"], expected);
        assert_eq!(entry["saveAsImage"], false);
    }
}

#[tokio::test]
async fn given_schema_violation_when_extracting_then_returns_bad_request() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    // target_category is missing entirely.
    let body = r#"{
        "categories": [],
        "content_markdown": "",
        "pages": []
    }"#;

    let response = post_json(app, "/extraction_category", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("target_category"));
    assert_eq!(json["code"], "invalid_request");
}

#[tokio::test]
async fn given_rate_limited_extractor_when_extracting_then_returns_too_many_requests() {
    let app = create_test_app(MockAnalyzer, RateLimitedChatClient);

    let response = post_json(app, "/extraction_category", extraction_request_body()).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "rate_limited");
}

#[tokio::test]
async fn given_failing_extractor_when_extracting_then_body_contains_error_detail() {
    let app = create_test_app(MockAnalyzer, FailingChatClient);

    let response = post_json(app, "/extraction_category", extraction_request_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("deployment offline"));
    assert_eq!(json["code"], "upstream_failure");
}

#[tokio::test]
async fn given_structure_response_when_sliced_and_resubmitted_then_round_trips() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = post_json(
        app.clone(),
        "/analyze_document_structure",
        analyze_request_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let structure = body_json(response).await;

    // Slice pages by the Budget category's page numbers, as a client would.
    let target = structure["categories"][1].clone();
    let page_numbers: Vec<u64> = target["page_numbers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_u64().unwrap())
        .collect();
    let pages: Vec<serde_json::Value> = structure["pages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| page_numbers.contains(&p["page_number"].as_u64().unwrap()))
        .cloned()
        .collect();

    let body = serde_json::json!({
        "target_category": target,
        "categories": structure["categories"],
        "content_markdown": structure["content_markdown"],
        "pages": pages,
    });

    let response = post_json(app, "/extraction_category", body.to_string()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let entries = json["pages"].as_array().unwrap();
    assert_eq!(entries.len(), page_numbers.len());
    assert_eq!(entries[0]["pageNumber"], 2);
    assert_eq!(entries[0]["saveAsImage"], false);
}

#[tokio::test]
async fn given_request_without_id_when_any_endpoint_then_response_contains_request_id() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn given_request_with_id_when_any_endpoint_then_response_echoes_request_id() {
    let app = create_test_app(MockAnalyzer, MockChatClient);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-request-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-123"
    );
}
