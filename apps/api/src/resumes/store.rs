//! Resume persistence with soft-delete semantics.
//!
//! Every read path in this module filters `deleted_at IS NULL` and scopes by
//! owner; handlers never build their own resume queries, so there is no way
//! to forget the filter.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeVersionRow};

pub struct NewResume<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub file_name: Option<&'a str>,
    pub file_size: Option<i64>,
    pub file_mime: Option<&'a str>,
    pub status: &'a str,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Omitting the key keeps the current value; an explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub structured: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub template_id: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub change_summary: Option<String>,
}

/// Deserializes a present key (including `null`) as `Some`, so a missing key
/// and an explicit `null` stay distinguishable.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub async fn insert_resume(
    conn: &mut PgConnection,
    new: NewResume<'_>,
) -> Result<ResumeRow, AppError> {
    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, title, content, file_name, file_size, file_mime, status, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.title)
    .bind(new.content)
    .bind(new.file_name)
    .bind(new.file_size)
    .bind(new.file_mime)
    .bind(new.status)
    .fetch_one(conn)
    .await?;
    Ok(resume)
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
    let rows = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_resume(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<ResumeRow>, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Applies an edit: snapshots the current row into `resume_versions`, then
/// bumps the version counter. Both writes share one transaction.
pub async fn update_resume(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    update: ResumeUpdate,
) -> Result<Option<ResumeRow>, AppError> {
    let mut tx = pool.begin().await?;

    let Some(current) = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    sqlx::query(
        r#"
        INSERT INTO resume_versions (id, resume_id, version, content, structured, change_summary)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(current.id)
    .bind(current.version)
    .bind(&current.content)
    .bind(&current.structured)
    .bind(&update.change_summary)
    .execute(&mut *tx)
    .await?;

    let structured = match update.structured {
        Some(explicit) => explicit,
        None => current.structured,
    };
    let template_id = match update.template_id {
        Some(explicit) => explicit,
        None => current.template_id,
    };

    let updated = sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes
        SET title = $3,
            content = $4,
            structured = $5,
            template_id = $6,
            status = $7,
            version = version + 1,
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(update.title.unwrap_or(current.title))
    .bind(update.content.unwrap_or(current.content))
    .bind(structured)
    .bind(template_id)
    .bind(update.status.unwrap_or(current.status))
    .fetch_one(&mut *tx)
    .await?;

    if let Some(adopted) = adopted_template(current.template_id, updated.template_id) {
        sqlx::query("UPDATE templates SET usage_count = usage_count + 1 WHERE id = $1")
            .bind(adopted)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(Some(updated))
}

/// A template counts as adopted when the edit sets one the resume did not
/// already reference.
fn adopted_template(old: Option<Uuid>, new: Option<Uuid>) -> Option<Uuid> {
    match new {
        Some(id) if old != Some(id) => Some(id),
        _ => None,
    }
}

/// Soft delete: marks `deleted_at`, leaving the row and its versions in place.
pub async fn soft_delete_resume(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE resumes SET deleted_at = now() WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_resume_versions(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Vec<ResumeVersionRow>, AppError> {
    // Join through resumes so versions stay owner-scoped.
    let rows = sqlx::query_as::<_, ResumeVersionRow>(
        r#"
        SELECT v.* FROM resume_versions v
        JOIN resumes r ON r.id = v.resume_id
        WHERE v.resume_id = $1 AND r.user_id = $2
        ORDER BY v.version DESC
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::create_user;

    #[test]
    fn test_update_omitted_fields_stay_untouched() {
        let update: ResumeUpdate = serde_json::from_str(r#"{"title": "New title"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New title"));
        assert!(update.structured.is_none());
        assert!(update.template_id.is_none());
    }

    #[test]
    fn test_update_explicit_null_clears_field() {
        let update: ResumeUpdate =
            serde_json::from_str(r#"{"structured": null, "templateId": null}"#).unwrap();
        assert_eq!(update.structured, Some(None));
        assert_eq!(update.template_id, Some(None));
    }

    #[test]
    fn test_template_adoption_detection() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(adopted_template(None, Some(a)), Some(a));
        assert_eq!(adopted_template(Some(a), Some(b)), Some(b));
        assert_eq!(adopted_template(Some(a), Some(a)), None);
        assert_eq!(adopted_template(Some(a), None), None);
        assert_eq!(adopted_template(None, None), None);
    }

    async fn seed_resume(pool: &PgPool) -> (Uuid, ResumeRow) {
        let user_id = create_user(pool, "owner@example.com", "hash", None, None)
            .await
            .unwrap()
            .id;
        let mut conn = pool.acquire().await.unwrap();
        let resume = insert_resume(
            &mut conn,
            NewResume {
                user_id,
                title: "My Resume",
                content: "original text",
                file_name: Some("resume.pdf"),
                file_size: Some(1024),
                file_mime: Some("application/pdf"),
                status: "analyzed",
            },
        )
        .await
        .unwrap();
        (user_id, resume)
    }

    #[sqlx::test]
    async fn test_soft_deleted_resume_hidden_from_list_and_get(pool: PgPool) {
        let (user_id, resume) = seed_resume(&pool).await;

        assert!(soft_delete_resume(&pool, user_id, resume.id).await.unwrap());
        assert!(get_resume(&pool, user_id, resume.id)
            .await
            .unwrap()
            .is_none());
        assert!(list_resumes(&pool, user_id).await.unwrap().is_empty());
        // repeat delete finds nothing to mark
        assert!(!soft_delete_resume(&pool, user_id, resume.id).await.unwrap());
    }

    #[sqlx::test]
    async fn test_update_snapshots_prior_version_and_bumps(pool: PgPool) {
        let (user_id, resume) = seed_resume(&pool).await;

        let updated = update_resume(
            &pool,
            user_id,
            resume.id,
            ResumeUpdate {
                content: Some("revised text".to_string()),
                change_summary: Some("tightened summary".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.content, "revised text");

        let versions = list_resume_versions(&pool, user_id, resume.id)
            .await
            .unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].content, "original text");
        assert_eq!(versions[0].change_summary.as_deref(), Some("tightened summary"));
    }

    #[sqlx::test]
    async fn test_update_with_explicit_null_clears_structured(pool: PgPool) {
        let (user_id, resume) = seed_resume(&pool).await;

        let with_structured = update_resume(
            &pool,
            user_id,
            resume.id,
            ResumeUpdate {
                structured: Some(Some(serde_json::json!({"summary": "engineer"}))),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(with_structured.structured.is_some());

        let cleared = update_resume(
            &pool,
            user_id,
            resume.id,
            ResumeUpdate {
                structured: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(cleared.structured.is_none());
        assert_eq!(cleared.version, 3);
    }

    #[sqlx::test]
    async fn test_update_scoped_to_owner(pool: PgPool) {
        let (_, resume) = seed_resume(&pool).await;
        let other = create_user(&pool, "other@example.com", "hash", None, None)
            .await
            .unwrap()
            .id;

        let result = update_resume(
            &pool,
            other,
            resume.id,
            ResumeUpdate {
                title: Some("hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
