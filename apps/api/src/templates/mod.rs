//! Resume design templates. Templates referenced by resumes are deactivated,
//! never hard-deleted.

use axum::{extract::State, Json};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{ok, AppError};
use crate::models::template::TemplateRow;
use crate::state::AppState;

pub async fn list_templates(pool: &PgPool) -> Result<Vec<TemplateRow>, AppError> {
    let rows = sqlx::query_as::<_, TemplateRow>(
        "SELECT * FROM templates WHERE is_active = true ORDER BY usage_count DESC, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_template(pool: &PgPool, id: Uuid) -> Result<Option<TemplateRow>, AppError> {
    let row = sqlx::query_as::<_, TemplateRow>(
        "SELECT * FROM templates WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// GET /api/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let templates = list_templates(&state.db).await?;
    Ok(ok(templates))
}
