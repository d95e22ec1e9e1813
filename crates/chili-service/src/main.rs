//! ChiliPredict Service - HTTP API for customer purchase forecasting
//!
//! This is the main entry point for the chili-service binary.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chili_service::{create_router, AppState, ServiceConfig, StoreBackend};
use chili_store::{FirestoreStore, MemoryStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chili=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ChiliPredict Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        store_backend = ?config.store_backend,
        firebase_project = ?config.firebase_project_id,
        identity_configured = %config.firebase_api_key.is_some(),
        gemini_configured = %config.gemini_api_key.is_some(),
        "Service configuration loaded"
    );

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => {
            let project_id = config
                .firebase_project_id
                .clone()
                .ok_or("FIREBASE_PROJECT_ID is required for the Firestore backend")?;
            tracing::info!(project_id = %project_id, "Using Firestore store");
            Arc::new(FirestoreStore::new(
                &config.firestore_base_url,
                project_id,
                Duration::from_secs(config.request_timeout_seconds),
            )?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
