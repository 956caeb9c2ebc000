//! Application startup and lifecycle management.

use crate::config::EntryConfig;
use crate::handlers;
use crate::services::{init_metrics, EntryStore, LiveNotifier, PgEntryStore};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use service_core::retry::retry_with_backoff;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: EntryConfig,
    pub store: Arc<dyn EntryStore>,
    pub notifier: LiveNotifier,
}

impl AppState {
    pub fn new(config: EntryConfig, store: Arc<dyn EntryStore>) -> Self {
        let notifier = LiveNotifier::new(config.live_update_buffer);
        Self {
            config,
            store,
            notifier,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/api/entries",
            get(handlers::list_entries)
                .post(handlers::create_entry)
                .delete(handlers::delete_entries),
        )
        .route(
            "/api/entries/:id",
            get(handlers::get_entry).put(handlers::update_entry),
        )
        .route("/api/mark-entries", post(handlers::mark_entries))
        .route("/api/datewise-total", post(handlers::datewise_total))
        .route("/api/reports/qualitywise", get(handlers::qualitywise))
        .route("/api/export/pdf", post(handlers::export_pdf))
        .route("/api/export/excel", post(handlers::export_excel))
        .route("/api/export/datewise-pdf", post(handlers::export_datewise_pdf))
        .route(
            "/api/export/datewise-excel",
            post(handlers::export_datewise_excel),
        )
        .route(
            "/api/export/qualitywise-pdf",
            post(handlers::export_qualitywise_pdf),
        )
        .route(
            "/api/export/qualitywise-excel",
            post(handlers::export_qualitywise_excel),
        )
        .route("/api/events", get(handlers::live_updates))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connects to PostgreSQL, applies migrations and binds the listener.
    pub async fn build(config: EntryConfig) -> Result<Self, AppError> {
        init_metrics();

        // The database may still be starting; only this first connection is retried.
        let db = retry_with_backoff(&config.database.retry(), "postgres_connect", || {
            PgEntryStore::connect(
                &config.database.url,
                config.database.max_connections,
                config.database.min_connections,
            )
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        Self::with_store(config, Arc::new(db)).await
    }

    /// Bind the listener around an already constructed store.
    pub async fn with_store(
        config: EntryConfig,
        store: Arc<dyn EntryStore>,
    ) -> Result<Self, AppError> {
        let addr = config.common.bind_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Entry service listener bound");

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, store),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "entry-service",
            version = %self.state.config.service_version,
            port = self.port,
            "Service ready to accept connections"
        );

        let router = build_router(self.state);

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
