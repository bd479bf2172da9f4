//! API key check for inbound requests

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use super::error::ApiError;
use super::routes::AppState;
use crate::upstream::API_KEY_HEADER;

/// Reject requests without the configured key. `GET /health` is always let through.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    if request.method() == Method::GET && request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided != Some(expected) {
        tracing::debug!("Rejected {} {}: bad API key", request.method(), request.uri().path());
        return Err(ApiError::unauthorized());
    }

    Ok(next.run(request).await)
}
