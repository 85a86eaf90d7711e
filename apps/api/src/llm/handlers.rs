use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::{ok, AppError};
use crate::state::AppState;

/// GET /api/models
pub async fn handle_list_models(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let models = state
        .catalog
        .get()
        .await
        .map_err(|e| AppError::Llm(format!("Failed to fetch model catalog: {e}")))?;

    Ok(ok(json!({
        "models": models,
        "defaultModel": state.config.default_model,
    })))
}

/// POST /api/models/refresh
pub async fn handle_refresh_models(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let models = state
        .catalog
        .refresh()
        .await
        .map_err(|e| AppError::Llm(format!("Failed to refresh model catalog: {e}")))?;

    Ok(ok(json!({ "models": models, "refreshed": true })))
}
