mod analysis;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod job_descriptions;
mod llm;
mod models;
mod render;
mod resumes;
mod routes;
mod state;
mod templates;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::JwtService;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm::catalog::ModelCatalog;
use crate::llm::LlmGateway;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config).await?;

    // Initialize the model gateway and the catalog cache that feeds off it
    let llm = LlmGateway::new(
        config.openrouter_base_url.clone(),
        config.openrouter_api_key.clone(),
        config.default_model.clone(),
    );
    let catalog = Arc::new(ModelCatalog::new(Arc::new(llm.clone())));
    info!(
        "Model gateway initialized (default model: {})",
        config.default_model
    );

    // Initialize JWT signing
    let jwt = JwtService::new(
        &config.jwt_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    // Build app state
    let state = AppState {
        db,
        llm,
        catalog,
        jwt,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
