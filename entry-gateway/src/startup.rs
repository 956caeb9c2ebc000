use axum::{middleware::from_fn, routing::any, routing::get, Router};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, metrics, proxy_api};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/*path", any(proxy_api))
        .fallback_service(assets)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
