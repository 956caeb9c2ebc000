use dotenvy::dotenv;
use entry_gateway::config::get_configuration;
use entry_gateway::services::EntryClient;
use entry_gateway::startup::build_router;
use entry_gateway::AppState;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "entry-gateway",
        &configuration.log_level,
        configuration.otlp_endpoint.as_deref(),
    );

    entry_gateway::services::metrics::init_metrics();

    let entry_client = Arc::new(
        EntryClient::new(&configuration.entry_service)
            .map_err(|e| anyhow::anyhow!("Failed to create entry-service client: {}", e))?,
    );
    info!(upstream = %entry_client.base_url(), "Forwarding /api to entry-service");

    let app = build_router(AppState::new(entry_client, &configuration.static_dir));

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!(address = %address, error = %e, "Failed to bind TCP listener");
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(address = %address, "Starting entry-gateway");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Server error");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}
