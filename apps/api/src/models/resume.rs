use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Extracted or manually entered text; may also hold serialized
    /// structured JSON from older clients.
    pub content: String,
    pub structured: Option<Value>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_mime: Option<String>,
    pub template_id: Option<Uuid>,
    pub status: String,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only snapshot of a resume taken before each edit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeVersionRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub version: i32,
    pub content: String,
    pub structured: Option<Value>,
    pub change_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}
