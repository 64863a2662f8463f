use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    /// Whether extraction can save page regions as images. The
    /// `saveAsImage` flag in extraction responses stays false until
    /// this is implemented; clients should check here instead of
    /// hardcoding that assumption.
    pub page_image_export: bool,
}

pub async fn capabilities_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(CapabilitiesResponse {
            page_image_export: false,
        }),
    )
}
