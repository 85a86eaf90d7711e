//! Sequences the pipeline stages and persists the
//! resume, job description, and analysis as one atomic unit.
//!
//! Failure at any stage aborts the rest: missing inputs and short text are
//! validation errors (400), extraction failures are content errors (400),
//! gateway/normalizer failures are analysis errors (500), and persistence
//! failures are storage errors (500). Nothing is written before the model
//! call succeeds, so a rejected upload leaves no rows behind.

use bytes::Bytes;
use serde_json::Value;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::analysis::normalizer::normalize_response;
use crate::analysis::prompts::{build_analysis_prompt, ANALYZE_SYSTEM};
use crate::analysis::store::{insert_analysis, NewAnalysis};
use crate::errors::AppError;
use crate::extract::{extract_text, MIME_DOCX, MIME_PDF, MIN_TEXT_LEN};
use crate::job_descriptions::store::upsert_job_description;
use crate::llm::GenerationParams;
use crate::resumes::store::{insert_resume, NewResume};
use crate::state::AppState;

/// Upload cap on the analysis path. The legacy product allowed 10 MB on its
/// general file-storage path; that path has no counterpart here (see DESIGN.md).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const PROVIDER: &str = "openrouter";

pub struct AnalyzeInput {
    pub file_name: String,
    pub file_bytes: Bytes,
    pub mime: String,
    pub job_description: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub params: GenerationParams,
}

pub struct AnalyzeOutcome {
    pub payload: Value,
    pub analysis_id: Uuid,
    pub resume_id: Uuid,
    pub job_description_id: Uuid,
    pub model_used: String,
    pub processing_ms: i64,
}

pub async fn run_analysis(
    state: &AppState,
    user_id: Uuid,
    input: AnalyzeInput,
) -> Result<AnalyzeOutcome, AppError> {
    validate_input(&input)?;
    let started = Instant::now();

    let extracted = extract_text(&input.file_bytes, &input.mime)
        .map_err(|e| AppError::Extraction(e.to_string()))?;
    if extracted.char_count < MIN_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Insufficient text extracted from the resume ({} characters, minimum {MIN_TEXT_LEN}). \
             Upload a resume with more content.",
            extracted.char_count
        )));
    }
    info!(
        "Extracted {} chars / {} words from '{}'",
        extracted.char_count, extracted.word_count, input.file_name
    );

    let prompt = build_analysis_prompt(&extracted.text, &input.job_description);
    let completion = state
        .llm
        .complete(&prompt, ANALYZE_SYSTEM, &input.params)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let parsed = normalize_response(&completion.text)
        .map_err(|e| AppError::Llm(format!("invalid model response: {e}")))?;
    let payload = parsed.into_payload(&completion.model);
    let processing_ms = started.elapsed().as_millis() as i64;

    // Persist resume + job description + analysis atomically.
    let mut tx = state.db.begin().await?;

    let resume = insert_resume(
        &mut tx,
        NewResume {
            user_id,
            title: &resume_title(&input.file_name),
            content: &extracted.text,
            file_name: Some(&input.file_name),
            file_size: Some(input.file_bytes.len() as i64),
            file_mime: Some(&input.mime),
            status: "analyzed",
        },
    )
    .await?;

    let job_title = input
        .job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled position");
    let job_description = upsert_job_description(
        &mut tx,
        user_id,
        job_title,
        input.company.as_deref(),
        &input.job_description,
    )
    .await?;

    let analysis = insert_analysis(
        &mut tx,
        NewAnalysis {
            user_id,
            resume_id: resume.id,
            job_description_id: job_description.id,
            provider: PROVIDER,
            model: &completion.model,
            result: &payload,
            processing_ms,
            usage: completion.usage,
        },
    )
    .await?;

    sqlx::query("UPDATE users SET resumes_created = resumes_created + 1 WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Analysis {} completed for user {} in {}ms (model: {})",
        analysis.id, user_id, processing_ms, completion.model
    );

    Ok(AnalyzeOutcome {
        payload,
        analysis_id: analysis.id,
        resume_id: resume.id,
        job_description_id: job_description.id,
        model_used: completion.model,
        processing_ms,
    })
}

fn validate_input(input: &AnalyzeInput) -> Result<(), AppError> {
    if input.file_bytes.is_empty() {
        return Err(AppError::Validation("A resume file is required".to_string()));
    }
    if input.file_bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "Resume file exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    if !matches!(input.mime.as_str(), MIME_PDF | MIME_DOCX) {
        return Err(AppError::Validation(
            "Only PDF and DOCX resumes are supported".to_string(),
        ));
    }
    if input.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "A job description is required".to_string(),
        ));
    }
    Ok(())
}

fn resume_title(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
        .trim();
    if stem.is_empty() {
        "Uploaded resume".to_string()
    } else {
        stem.to_string()
    }
}
