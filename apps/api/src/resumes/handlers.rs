use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{ok, AppError};
use crate::models::resume::ResumeRow;
use crate::models::template::TemplateRow;
use crate::render::{self, document_from_resume, ResumeDocument};
use crate::resumes::store::{self, ResumeUpdate};
use crate::state::AppState;

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let resumes = store::list_resumes(&state.db, user.user_id).await?;
    Ok(ok(resumes))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let resume = require_resume(&state, user.user_id, id).await?;
    Ok(ok(resume))
}

/// PUT /api/resumes/:id. Snapshots the prior version before applying the edit.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ResumeUpdate>,
) -> Result<Json<Value>, AppError> {
    let resume = store::update_resume(&state.db, user.user_id, id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(ok(resume))
}

/// DELETE /api/resumes/:id (soft delete).
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = store::soft_delete_resume(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}

/// GET /api/resumes/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_resume(&state, user.user_id, id).await?;
    let versions = store::list_resume_versions(&state.db, user.user_id, id).await?;
    Ok(ok(versions))
}

/// GET /api/resumes/:id/preview. Rendered HTML for the stored resume.
pub async fn handle_preview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let resume = require_resume(&state, user.user_id, id).await?;
    let template = load_template(&state, &resume).await?;
    let doc = document_from_resume(&resume);
    Ok(Html(render::html::render_html(
        &doc,
        template.as_ref().map(|t| t.css.as_str()),
    )))
}

/// POST /api/resumes/:id/preview. Renders caller-supplied structured data
/// without persisting it, for live editing.
pub async fn handle_preview_draft(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(doc): Json<ResumeDocument>,
) -> Result<Html<String>, AppError> {
    let resume = require_resume(&state, user.user_id, id).await?;
    let template = load_template(&state, &resume).await?;
    Ok(Html(render::html::render_html(
        &doc,
        template.as_ref().map(|t| t.css.as_str()),
    )))
}

/// GET /api/resumes/:id/export/pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = require_resume(&state, user.user_id, id).await?;
    let doc = document_from_resume(&resume);
    let buffer = render::pdf::render_pdf(&doc).map_err(|e| AppError::Render(e.to_string()))?;
    Ok(attachment(buffer, "application/pdf", &resume.title, "pdf"))
}

/// GET /api/resumes/:id/export/word
pub async fn handle_export_docx(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = require_resume(&state, user.user_id, id).await?;
    let doc = document_from_resume(&resume);
    let buffer = render::docx::render_docx(&doc).map_err(|e| AppError::Render(e.to_string()))?;
    Ok(attachment(
        buffer,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &resume.title,
        "docx",
    ))
}

async fn require_resume(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<ResumeRow, AppError> {
    store::get_resume(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn load_template(
    state: &AppState,
    resume: &ResumeRow,
) -> Result<Option<TemplateRow>, AppError> {
    match resume.template_id {
        Some(template_id) => crate::templates::get_template(&state.db, template_id).await,
        None => Ok(None),
    }
}

fn attachment(buffer: Vec<u8>, content_type: &str, title: &str, ext: &str) -> Response {
    let filename: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}.{ext}\""),
            ),
        ],
        buffer,
    )
        .into_response()
}
