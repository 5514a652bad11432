use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Course, CourseFilter, CourseLevel, CourseStatus};

const COURSE_COLUMNS: &str = r#"
    id, title, slug, description, level, status, xp_reward,
    series_id, series_position, published_at, archived_at, created_at, updated_at
"#;

pub async fn list<'e, E>(executor: E, filter: &CourseFilter) -> Result<Vec<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE ($1::course_status IS NULL OR status = $1)
              AND ($2::course_level IS NULL OR level = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
        "#
    );

    sqlx::query_as(&sql)
        .bind(filter.status)
        .bind(filter.level)
        .bind(filter.search.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(executor)
        .await
}

pub async fn count<'e, E>(executor: E, filter: &CourseFilter) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM courses
            WHERE ($1::course_status IS NULL OR status = $1)
              AND ($2::course_level IS NULL OR level = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
        "#,
    )
    .bind(filter.status)
    .bind(filter.level)
    .bind(filter.search.as_deref())
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, course_id: Uuid) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");

    sqlx::query_as(&sql)
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    course_id: Uuid,
) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 FOR UPDATE");

    sqlx::query_as(&sql)
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

pub async fn exists<'e, E>(executor: E, course_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub async fn slug_exists<'e, E>(executor: E, slug: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM courses WHERE slug = $1)
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
    level: CourseLevel,
    xp_reward: i32,
) -> Result<Course, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO courses (title, slug, description, level, xp_reward)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COURSE_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(title)
        .bind(slug)
        .bind(description)
        .bind(level)
        .bind(xp_reward)
        .fetch_one(executor)
        .await
}

/// Partial update; `None` keeps the current value.
pub async fn update<'e, E>(
    executor: E,
    course_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    level: Option<CourseLevel>,
    xp_reward: Option<i32>,
) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                level = COALESCE($4, level),
                xp_reward = COALESCE($5, xp_reward),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(course_id)
        .bind(title)
        .bind(description)
        .bind(level)
        .bind(xp_reward)
        .fetch_optional(executor)
        .await
}

pub async fn set_status<'e, E>(
    executor: E,
    course_id: Uuid,
    status: CourseStatus,
) -> Result<Course, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET status = $2,
                published_at = CASE WHEN $2 = 'published'::course_status THEN NOW() ELSE published_at END,
                archived_at = CASE WHEN $2 = 'archived'::course_status THEN NOW() ELSE archived_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(course_id)
        .bind(status)
        .fetch_one(executor)
        .await
}

pub async fn delete<'e, E>(executor: E, course_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM courses WHERE id = $1
        "#,
    )
    .bind(course_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_active_enrollments<'e, E>(executor: E, course_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM enrollments
            WHERE course_id = $1 AND status = 'active'
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub async fn count_lessons<'e, E>(executor: E, course_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(l.id)
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub async fn list_by_series<'e, E>(executor: E, series_id: Uuid) -> Result<Vec<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE series_id = $1 ORDER BY series_position ASC"
    );

    sqlx::query_as(&sql)
        .bind(series_id)
        .fetch_all(executor)
        .await
}
