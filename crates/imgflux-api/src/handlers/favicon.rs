use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Browsers ask for this on every page view; answer without touching the pipeline.
pub async fn favicon() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "image/x-icon")], "")
}
