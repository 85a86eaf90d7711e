use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::orchestrator::{run_analysis, AnalyzeInput};
use crate::analysis::store;
use crate::auth::AuthUser;
use crate::errors::{ok, AppError};
use crate::llm::GenerationParams;
use crate::state::AppState;

/// POST /api/analyze. Multipart form: `resume` file, `jobDescription` text,
/// optional `jobTitle`, `company`, `model`, `temperature`, `maxTokens`,
/// `includeReasoning`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut file_bytes: Option<Bytes> = None;
    let mut file_name = String::from("resume");
    let mut mime = String::new();
    let mut job_description = String::new();
    let mut job_title: Option<String> = None;
    let mut company: Option<String> = None;
    let mut params = GenerationParams::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                file_name = field.file_name().unwrap_or("resume").to_string();
                mime = field.content_type().unwrap_or_default().to_string();
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Could not read uploaded file: {e}"))
                })?);
            }
            "jobDescription" => job_description = read_text(field).await?,
            "jobTitle" => job_title = Some(read_text(field).await?),
            "company" => company = Some(read_text(field).await?),
            "model" => params.model = Some(read_text(field).await?),
            "temperature" => {
                params.temperature = Some(read_text(field).await?.parse().map_err(|_| {
                    AppError::Validation("temperature must be a number".to_string())
                })?)
            }
            "maxTokens" => {
                params.max_tokens = Some(read_text(field).await?.parse().map_err(|_| {
                    AppError::Validation("maxTokens must be a positive integer".to_string())
                })?)
            }
            "includeReasoning" => {
                params.include_reasoning = read_text(field).await?.trim() == "true"
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes
        .ok_or_else(|| AppError::Validation("A resume file is required".to_string()))?;

    let outcome = run_analysis(
        &state,
        user.user_id,
        AnalyzeInput {
            file_name,
            file_bytes,
            mime,
            job_description,
            job_title,
            company,
            params,
        },
    )
    .await?;

    let mut data = outcome.payload;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("savedAnalysisId".to_string(), json!(outcome.analysis_id));
        obj.insert("savedResumeId".to_string(), json!(outcome.resume_id));
        obj.insert(
            "savedJobDescriptionId".to_string(),
            json!(outcome.job_description_id),
        );
        obj.insert("processingMs".to_string(), json!(outcome.processing_ms));
    }
    Ok(ok(data))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart field: {e}")))
}

/// GET /api/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let analyses = store::list_analyses(&state.db, user.user_id).await?;
    Ok(ok(analyses))
}

/// GET /api/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let analysis = store::get_analysis(&state.db, user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(ok(analysis))
}
