use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use service_core::error::AppError;

/// Upstream response headers relayed to the browser. `set-cookie` may repeat.
pub const RELAYED_RESPONSE_HEADERS: &[&str] = &[
    "content-type",
    "content-disposition",
    "cache-control",
    "set-cookie",
];

/// Forwards any `/api/*` request to entry-service and streams the reply back,
/// so exports and the live update stream pass through unbuffered.
pub async fn proxy_api(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let upstream = state
        .entry_client
        .forward(method, path_and_query, &headers, body)
        .await?;

    let mut response = Response::builder().status(upstream.status());
    for name in RELAYED_RESPONSE_HEADERS {
        for value in upstream.headers().get_all(*name) {
            response = response.header(*name, value.clone());
        }
    }

    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to build response: {}", e)))
}
