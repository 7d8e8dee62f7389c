use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

/// Transform the image named by `url` using the operations in the query string.
///
/// Mounted as the router fallback, so any path other than the fixed routes lands here.
#[tracing::instrument(skip(state, query))]
pub async fn transform_image(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpAppError> {
    let output = state
        .transforms
        .handle(query.as_deref().unwrap_or_default())
        .await
        .map_err(|e| HttpAppError::new(e, state.config.is_production()))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, output.content_type)
        .header(header::CONTENT_LENGTH, output.bytes.len())
        .body(Body::from(output.bytes))
        .map_err(|e| HttpAppError::from(anyhow::anyhow!("Failed to build response: {}", e)))
}
