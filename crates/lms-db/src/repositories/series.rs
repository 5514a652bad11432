use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Series;

pub async fn list<'e, E>(executor: E) -> Result<Vec<Series>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, slug, description, created_at, updated_at
            FROM course_series
            ORDER BY title ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, series_id: Uuid) -> Result<Option<Series>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, slug, description, created_at, updated_at
            FROM course_series
            WHERE id = $1
        "#,
    )
    .bind(series_id)
    .fetch_optional(executor)
    .await
}

pub async fn slug_exists<'e, E>(executor: E, slug: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM course_series WHERE slug = $1)
        "#,
    )
    .bind(slug)
    .fetch_one(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    title: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<Series, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO course_series (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(slug)
    .bind(description)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    series_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Series>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE course_series
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, slug, description, created_at, updated_at
        "#,
    )
    .bind(series_id)
    .bind(title)
    .bind(description)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, series_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM course_series WHERE id = $1
        "#,
    )
    .bind(series_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Put a course into a series at `position`.
pub async fn attach_course<'e, E>(
    executor: E,
    series_id: Uuid,
    course_id: Uuid,
    position: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET series_id = $1, series_position = $3, updated_at = NOW()
            WHERE id = $2
        "#,
    )
    .bind(series_id)
    .bind(course_id)
    .bind(position)
    .execute(executor)
    .await?;

    Ok(())
}

/// Take a course out of its series. Returns `false` if it was not in `series_id`.
pub async fn detach_course<'e, E>(
    executor: E,
    series_id: Uuid,
    course_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET series_id = NULL, series_position = NULL, updated_at = NOW()
            WHERE id = $2 AND series_id = $1
        "#,
    )
    .bind(series_id)
    .bind(course_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Detach every course of a series, leaving the courses themselves in place.
pub async fn detach_all<'e, E>(executor: E, series_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET series_id = NULL, series_position = NULL, updated_at = NOW()
            WHERE series_id = $1
        "#,
    )
    .bind(series_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
