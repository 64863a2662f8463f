use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ChatClient, DocumentAnalyzer};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    analyze_document_structure_handler, capabilities_handler, extraction_category_handler,
    health_handler,
};
use crate::presentation::state::AppState;

// Base64-encoded PDFs routinely exceed axum's 2 MB default body limit.
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

pub fn create_router<D, C>(state: AppState<D, C>) -> Router
where
    D: DocumentAnalyzer + 'static,
    C: ChatClient + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/capabilities", get(capabilities_handler))
        .route(
            "/analyze_document_structure",
            post(analyze_document_structure_handler::<D, C>),
        )
        .route(
            "/extraction_category",
            post(extraction_category_handler::<D, C>),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
