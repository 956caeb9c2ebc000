use crate::config::EntryServiceSettings;
use crate::services::metrics::{UPSTREAM_DURATION, UPSTREAM_REQUESTS_TOTAL};
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use reqwest::Client;
use service_core::error::AppError;
use service_core::observability::inject_trace_headers;
use std::time::{Duration, Instant};

/// Request headers passed through to entry-service. Trace context and
/// `x-request-id` are added separately.
pub const FORWARDED_REQUEST_HEADERS: &[&str] =
    &["content-type", "accept", "cookie", "x-user-id"];

pub struct EntryClient {
    client: Client,
    base_url: String,
}

impl EntryClient {
    pub fn new(settings: &EntryServiceSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request upstream and returns as soon as response headers
    /// arrive; the body is left for the caller to stream.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        incoming: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let mut headers = HeaderMap::new();
        for name in FORWARDED_REQUEST_HEADERS {
            for value in incoming.get_all(*name) {
                headers.append(*name, value.clone());
            }
        }
        inject_trace_headers(incoming, &mut headers);

        let timer = UPSTREAM_DURATION
            .with_label_values(&[method.as_str()])
            .start_timer();
        let started = Instant::now();

        let result = self
            .client
            .request(method.clone(), &url)
            .headers(headers)
            .body(body)
            .send()
            .await;
        timer.observe_duration();

        match result {
            Ok(response) => {
                UPSTREAM_REQUESTS_TOTAL
                    .with_label_values(&[method.as_str(), response.status().as_str()])
                    .inc();
                tracing::debug!(
                    method = %method,
                    url = %url,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                Ok(response)
            }
            Err(e) => {
                UPSTREAM_REQUESTS_TOTAL
                    .with_label_values(&[method.as_str(), "unreachable"])
                    .inc();
                tracing::error!(method = %method, url = %url, error = %e, "Upstream request failed");
                Err(AppError::BadGateway(format!("entry-service unreachable: {}", e)))
            }
        }
    }
}
