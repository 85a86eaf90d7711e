use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{ok, AppError};
use crate::job_descriptions::store::{self, JobDescriptionInput};
use crate::state::AppState;

/// GET /api/job-descriptions
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let rows = store::list_job_descriptions(&state.db, user.user_id).await?;
    Ok(ok(rows))
}

/// POST /api/job-descriptions
pub async fn handle_create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<JobDescriptionInput>,
) -> Result<Json<Value>, AppError> {
    validate(&input)?;
    let row = store::insert_job_description(&state.db, user.user_id, &input).await?;
    Ok(ok(row))
}

/// GET /api/job-descriptions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let row = store::get_job_description(&state.db, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))?;
    Ok(ok(row))
}

/// PUT /api/job-descriptions/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<JobDescriptionInput>,
) -> Result<Json<Value>, AppError> {
    validate(&input)?;
    let row = store::update_job_description(&state.db, user.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))?;
    Ok(ok(row))
}

/// DELETE /api/job-descriptions/:id (soft delete).
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = store::soft_delete_job_description(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Job description {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}

fn validate(input: &JobDescriptionInput) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("A title is required".to_string()));
    }
    if input.description.trim().is_empty() {
        return Err(AppError::Validation("A description is required".to_string()));
    }
    Ok(())
}
