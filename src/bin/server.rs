//! TonePilot HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `TONEPILOT_SPECIALIZED_URL` — Base URL of the specialized inference endpoint
//! - `TONEPILOT_MODEL` — General model name (default: gpt-4o)
//! - `TONEPILOT_DOCS_DIR` — Directory of .txt documents to index
//! - `OPENAI_API_KEY` — API key for the generation service
//! - `RUST_LOG` — Tracing filter (default: "info")

use std::sync::Arc;

use tonepilot::config::Settings;
use tonepilot::server::{app_router, AppState};
use tonepilot::ServiceRegistry;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tonepilot=debug".into()),
        )
        .init();

    let settings = Settings::from_env();
    let bind_addr = format!("0.0.0.0:{}", settings.port);

    let registry = ServiceRegistry::bootstrap(settings)
        .await
        .expect("Failed to bootstrap services");
    let state = AppState::new(Arc::new(registry));

    let app = app_router(state);

    tracing::info!("tonepilot server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health         — liveness and component status");
    tracing::info!("  POST /convert        — two-stage tone conversion");
    tracing::info!("  POST /rag/ask        — grounded single answer");
    tracing::info!("  POST /rag/ask-styles — grounded three-style answer");
    tracing::info!("  POST /feedback       — feedback adaptation");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
