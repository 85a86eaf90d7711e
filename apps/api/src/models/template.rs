use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A resume design template. Deactivated, never hard-deleted, while any
/// resume references it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub css: String,
    pub structure: Value,
    pub is_premium: bool,
    pub is_active: bool,
    pub usage_count: i32,
    pub ats_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}
