//! Common test utilities for entry-service integration tests.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use entry_service::config::{DatabaseConfig, EntryConfig};
use entry_service::services::{EntryStore, MemoryEntryStore};
use entry_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Once};
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,entry_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config() -> EntryConfig {
    EntryConfig {
        common: CommonConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        service_name: "entry-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 2,
            min_connections: 1,
            connect_retries: 0,
            connect_backoff_ms: 10,
        },
        live_update_buffer: 16,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Response is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Router over an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryEntryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryEntryStore::new());
        let state = AppState::new(test_config(), store.clone() as Arc<dyn EntryStore>);
        Self {
            router: build_router(state.clone()),
            state,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn request_json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request_json(Method::POST, uri, body).await
    }

    /// Creates an entry and returns its JSON.
    pub async fn create(&self, body: Value) -> Value {
        let response = self.post("/api/entries", body).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.json());
        response.json()["data"].clone()
    }

    pub async fn create_id(&self, body: Value) -> i64 {
        self.create(body).await["id"].as_i64().unwrap()
    }
}

/// Scenario input: pairs (2×3),(1×4), rate 100, less rate 10, other 5.
/// Derives weight 10.00, amount 45.00, commission 0.68, total 50.68.
pub fn sample_entry(name: &str, date: &str, quality: &str) -> Value {
    json!({
        "entryDate": date,
        "name": name,
        "bags": 2,
        "bhartiPairs": [{ "a": 2, "b": 3 }, { "a": "1", "b": "4" }],
        "rate": 100,
        "lessRate": "10",
        "otherAmount": 5,
        "quality": quality,
        "item": "Wheat",
        "marketFee": 12
    })
}
