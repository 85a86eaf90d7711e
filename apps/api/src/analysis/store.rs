use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm::TokenUsage;
use crate::models::analysis::AnalysisRow;

pub struct NewAnalysis<'a> {
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_description_id: Uuid,
    pub provider: &'a str,
    pub model: &'a str,
    pub result: &'a Value,
    pub processing_ms: i64,
    pub usage: Option<TokenUsage>,
}

pub async fn insert_analysis(
    conn: &mut PgConnection,
    new: NewAnalysis<'_>,
) -> Result<AnalysisRow, AppError> {
    let analysis = sqlx::query_as::<_, AnalysisRow>(
        r#"
        INSERT INTO analyses
            (id, user_id, resume_id, job_description_id, analysis_type,
             provider, model, result, status, processing_ms,
             prompt_tokens, completion_tokens)
        VALUES ($1, $2, $3, $4, 'ats_score', $5, $6, $7, 'completed', $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.resume_id)
    .bind(new.job_description_id)
    .bind(new.provider)
    .bind(new.model)
    .bind(new.result)
    .bind(new.processing_ms)
    .bind(new.usage.map(|u| u.prompt_tokens))
    .bind(new.usage.map(|u| u.completion_tokens))
    .fetch_one(conn)
    .await?;
    Ok(analysis)
}

pub async fn list_analyses(pool: &PgPool, user_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
    let rows = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM analyses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_analysis(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<AnalysisRow>, AppError> {
    let row = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM analyses WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
