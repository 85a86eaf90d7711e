use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtService;
use crate::config::Config;
use crate::llm::catalog::ModelCatalog;
use crate::llm::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmGateway,
    /// Time-bounded single-flight cache of the provider's free-model listing.
    pub catalog: Arc<ModelCatalog>,
    pub jwt: JwtService,
    pub config: Config,
}
