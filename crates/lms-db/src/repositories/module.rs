use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Module;

pub async fn list_by_course<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Module>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, course_id, title, description, sort_order, created_at, updated_at
            FROM modules
            WHERE course_id = $1
            ORDER BY sort_order ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, module_id: Uuid) -> Result<Option<Module>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, course_id, title, description, sort_order, created_at, updated_at
            FROM modules
            WHERE id = $1
        "#,
    )
    .bind(module_id)
    .fetch_optional(executor)
    .await
}

/// Insert a module at `order`. The caller picks a free position under the parent lock.
pub async fn create<'e, E>(
    executor: E,
    course_id: Uuid,
    title: &str,
    description: Option<&str>,
    order: i32,
) -> Result<Module, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO modules (course_id, title, description, sort_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id, course_id, title, description, sort_order, created_at, updated_at
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(order)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    module_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Module>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE modules
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, course_id, title, description, sort_order, created_at, updated_at
        "#,
    )
    .bind(module_id)
    .bind(title)
    .bind(description)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, module_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM modules WHERE id = $1
        "#,
    )
    .bind(module_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
