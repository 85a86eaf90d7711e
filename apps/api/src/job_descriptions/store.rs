//! Job description persistence. Reads filter soft-deleted rows and scope by
//! owner inside each function.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job_description::JobDescriptionRow;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionInput {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub source_url: Option<String>,
}

/// Matches on (owner, title): an existing row gets its description overwritten
/// and its timestamp bumped; otherwise a new row is inserted. Two postings
/// that share a title therefore merge into one record, a known product
/// ambiguity carried over deliberately (see DESIGN.md). The unique partial
/// index on (user_id, title) arbitrates, so concurrent analyses sharing a
/// title cannot produce duplicate rows.
pub async fn upsert_job_description(
    conn: &mut PgConnection,
    user_id: Uuid,
    title: &str,
    company: Option<&str>,
    description: &str,
) -> Result<JobDescriptionRow, AppError> {
    let row = sqlx::query_as::<_, JobDescriptionRow>(
        r#"
        INSERT INTO job_descriptions (id, user_id, title, company, description)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, title) WHERE deleted_at IS NULL
        DO UPDATE SET
            description = EXCLUDED.description,
            company = COALESCE(EXCLUDED.company, job_descriptions.company),
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(company)
    .bind(description)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn insert_job_description(
    pool: &PgPool,
    user_id: Uuid,
    input: &JobDescriptionInput,
) -> Result<JobDescriptionRow, AppError> {
    let row = sqlx::query_as::<_, JobDescriptionRow>(
        r#"
        INSERT INTO job_descriptions (id, user_id, title, company, location, description, source_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.company)
    .bind(&input.location)
    .bind(&input.description)
    .bind(&input.source_url)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn list_job_descriptions(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<JobDescriptionRow>, AppError> {
    let rows = sqlx::query_as::<_, JobDescriptionRow>(
        "SELECT * FROM job_descriptions WHERE user_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_job_description(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<JobDescriptionRow>, AppError> {
    let row = sqlx::query_as::<_, JobDescriptionRow>(
        "SELECT * FROM job_descriptions WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_job_description(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    input: &JobDescriptionInput,
) -> Result<Option<JobDescriptionRow>, AppError> {
    let row = sqlx::query_as::<_, JobDescriptionRow>(
        r#"
        UPDATE job_descriptions
        SET title = $3, company = $4, location = $5, description = $6, source_url = $7,
            updated_at = now()
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.company)
    .bind(&input.location)
    .bind(&input.description)
    .bind(&input.source_url)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn soft_delete_job_description(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE job_descriptions SET deleted_at = now() WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::create_user;

    async fn owner(pool: &PgPool) -> Uuid {
        create_user(pool, "owner@example.com", "hash", None, None)
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    async fn test_upsert_overwrites_same_title_in_place(pool: PgPool) {
        let user_id = owner(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let first = upsert_job_description(&mut conn, user_id, "Staff Engineer", None, "old text")
            .await
            .unwrap();
        let second = upsert_job_description(
            &mut conn,
            user_id,
            "Staff Engineer",
            Some("Acme"),
            "new text",
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.description, "new text");
        assert_eq!(second.company.as_deref(), Some("Acme"));

        let all = list_job_descriptions(&pool, user_id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[sqlx::test]
    async fn test_upsert_keeps_company_when_update_omits_it(pool: PgPool) {
        let user_id = owner(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        upsert_job_description(&mut conn, user_id, "SRE", Some("Initech"), "v1")
            .await
            .unwrap();
        let updated = upsert_job_description(&mut conn, user_id, "SRE", None, "v2")
            .await
            .unwrap();

        assert_eq!(updated.description, "v2");
        assert_eq!(updated.company.as_deref(), Some("Initech"));
    }

    #[sqlx::test]
    async fn test_upsert_distinct_titles_create_distinct_rows(pool: PgPool) {
        let user_id = owner(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let a = upsert_job_description(&mut conn, user_id, "Staff Engineer", None, "text a")
            .await
            .unwrap();
        let b = upsert_job_description(&mut conn, user_id, "Engineering Manager", None, "text b")
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        let all = list_job_descriptions(&pool, user_id).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test]
    async fn test_soft_deleted_row_hidden_from_list_and_get(pool: PgPool) {
        let user_id = owner(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let row = upsert_job_description(&mut conn, user_id, "Staff Engineer", None, "text")
            .await
            .unwrap();
        drop(conn);

        assert!(soft_delete_job_description(&pool, user_id, row.id)
            .await
            .unwrap());
        assert!(get_job_description(&pool, user_id, row.id)
            .await
            .unwrap()
            .is_none());
        assert!(list_job_descriptions(&pool, user_id).await.unwrap().is_empty());
    }
}
