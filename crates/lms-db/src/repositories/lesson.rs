use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Lesson, LessonContext, LessonKind};

const LESSON_COLUMNS: &str = r#"
    id, module_id, title, content, kind, duration_minutes, xp_reward, sort_order,
    created_at, updated_at
"#;

/// Fields accepted when creating a lesson
#[derive(Debug, Clone)]
pub struct NewLesson<'a> {
    pub title: &'a str,
    pub content: Option<&'a str>,
    pub kind: LessonKind,
    pub duration_minutes: i32,
    pub xp_reward: i32,
}

/// Partial lesson update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct LessonChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub kind: Option<LessonKind>,
    pub duration_minutes: Option<i32>,
    pub xp_reward: Option<i32>,
}

pub async fn list_by_module<'e, E>(executor: E, module_id: Uuid) -> Result<Vec<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE module_id = $1 ORDER BY sort_order ASC"
    );

    sqlx::query_as(&sql)
        .bind(module_id)
        .fetch_all(executor)
        .await
}

/// Every lesson of a course, ordered by module then lesson position.
pub async fn list_by_course<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT l.id, l.module_id, l.title, l.content, l.kind, l.duration_minutes,
                   l.xp_reward, l.sort_order, l.created_at, l.updated_at
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY m.sort_order ASC, l.sort_order ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, lesson_id: Uuid) -> Result<Option<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1");

    sqlx::query_as(&sql)
        .bind(lesson_id)
        .fetch_optional(executor)
        .await
}

pub async fn create<'e, E>(
    executor: E,
    module_id: Uuid,
    lesson: &NewLesson<'_>,
    order: i32,
) -> Result<Lesson, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            INSERT INTO lessons (module_id, title, content, kind, duration_minutes, xp_reward, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LESSON_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(module_id)
        .bind(lesson.title)
        .bind(lesson.content)
        .bind(lesson.kind)
        .bind(lesson.duration_minutes)
        .bind(lesson.xp_reward)
        .bind(order)
        .fetch_one(executor)
        .await
}

pub async fn update<'e, E>(
    executor: E,
    lesson_id: Uuid,
    changes: &LessonChanges<'_>,
) -> Result<Option<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE lessons
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                kind = COALESCE($4, kind),
                duration_minutes = COALESCE($5, duration_minutes),
                xp_reward = COALESCE($6, xp_reward),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(lesson_id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.kind)
        .bind(changes.duration_minutes)
        .bind(changes.xp_reward)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E>(executor: E, lesson_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM lessons WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Re-parent a lesson and give it `order` in the target module.
pub async fn move_to_module<'e, E>(
    executor: E,
    lesson_id: Uuid,
    target_module_id: Uuid,
    order: i32,
) -> Result<Lesson, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        // language=PostgreSQL
        r#"
            UPDATE lessons
            SET module_id = $2, sort_order = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
        "#
    );

    sqlx::query_as(&sql)
        .bind(lesson_id)
        .bind(target_module_id)
        .bind(order)
        .fetch_one(executor)
        .await
}

pub async fn find_context<'e, E>(
    executor: E,
    lesson_id: Uuid,
) -> Result<Option<LessonContext>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT l.id AS lesson_id,
                   l.module_id,
                   m.course_id,
                   l.xp_reward AS lesson_xp,
                   c.xp_reward AS course_xp
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE l.id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}
