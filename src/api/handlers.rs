//! API request handlers

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Json,
};

use super::error::ApiError;
use super::routes::AppState;
use crate::types::{HealthStatus, Record, RouteInfo};
use crate::upstream::{Upstream, UpstreamResponse};

// Helpers

/// Forward the raw request body to `upstream` at the same path and relay the answer
async fn passthrough(
    state: &AppState,
    upstream: Upstream,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let response = state
        .upstreams
        .forward(upstream, path, content_type, body.to_vec())
        .await?;

    Ok(relay(response))
}

/// Rebuild the upstream answer; `Content-Type` only appears when the upstream sent one
fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    if let Some(content_type) = upstream
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }

    response
}

// Handlers

/// Liveness of the gateway itself
pub async fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus::up())
}

/// Relay the health endpoint of the upstream named `app`
pub async fn get_health_upstream(
    State(state): State<AppState>,
    Path(app): Path<String>,
) -> Result<Response, ApiError> {
    let response = state.upstreams.health(&app).await?;
    Ok(relay(response))
}

/// Always fails; exercises error rendering
pub async fn get_error() -> Result<(), ApiError> {
    Err(ApiError::internal())
}

/// Every method/path/handler triple registered on the router
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteInfo>> {
    Json(state.routes.to_vec())
}

pub async fn get_keywords(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    passthrough(&state, Upstream::Rake, "/keywords", &headers, body).await
}

pub async fn get_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    passthrough(&state, Upstream::Prose, "/tokens", &headers, body).await
}

pub async fn get_entities(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    passthrough(&state, Upstream::Prose, "/entities", &headers, body).await
}

pub async fn get_sentences(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    passthrough(&state, Upstream::Prose, "/sentences", &headers, body).await
}

pub async fn get_language(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    passthrough(&state, Upstream::Lang, "/language", &headers, body).await
}

/// Persist a JSON document in the record store
pub async fn put_record(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let record = Record::new(body);
    state.records.put(&record)?;

    tracing::debug!("Stored record {}", record.id);
    Ok((StatusCode::CREATED, Json(record)))
}
