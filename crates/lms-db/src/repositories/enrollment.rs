use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Enrollment, EnrollmentProgress, Prerequisite};

pub async fn find_for_update<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, course_id, status, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = $1 AND course_id = $2
            FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO enrollments (user_id, course_id)
            VALUES ($1, $2)
            RETURNING user_id, course_id, status, enrolled_at, completed_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Turn a dropped enrollment back into an active one.
pub async fn reactivate<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE enrollments
            SET status = 'active', enrolled_at = NOW(), completed_at = NULL
            WHERE user_id = $1 AND course_id = $2
            RETURNING user_id, course_id, status, enrolled_at, completed_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Drop an active enrollment. Returns `None` when there is no active one.
pub async fn drop_active<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE enrollments
            SET status = 'dropped'
            WHERE user_id = $1 AND course_id = $2 AND status = 'active'
            RETURNING user_id, course_id, status, enrolled_at, completed_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub async fn mark_completed<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE enrollments
            SET status = 'completed', completed_at = NOW()
            WHERE user_id = $1 AND course_id = $2
            RETURNING user_id, course_id, status, enrolled_at, completed_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Prerequisites of `course_id` the learner has not completed.
pub async fn missing_prerequisites<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Vec<Prerequisite>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cp.course_id, cp.prerequisite_course_id, c.title, c.slug, cp.created_at
            FROM course_prerequisites cp
            JOIN courses c ON c.id = cp.prerequisite_course_id
            WHERE cp.course_id = $2
              AND NOT EXISTS (
                  SELECT 1 FROM enrollments e
                  WHERE e.user_id = $1
                    AND e.course_id = cp.prerequisite_course_id
                    AND e.status = 'completed'
              )
            ORDER BY c.title ASC
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Record a lesson completion. Returns `false` if it was already recorded.
pub async fn insert_lesson_completion<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO lesson_completions (user_id, lesson_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Lessons of the course the learner has not completed yet.
pub async fn count_remaining_lessons<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(l.id)
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $2
              AND NOT EXISTS (
                  SELECT 1 FROM lesson_completions lc
                  WHERE lc.user_id = $1 AND lc.lesson_id = l.id
              )
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub async fn list_progress<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<EnrollmentProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT e.course_id,
                   c.title,
                   c.slug,
                   e.status,
                   e.enrolled_at,
                   e.completed_at,
                   COUNT(lc.lesson_id) AS completed_lessons,
                   COUNT(l.id) AS total_lessons
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            LEFT JOIN modules m ON m.course_id = c.id
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_completions lc ON lc.lesson_id = l.id AND lc.user_id = e.user_id
            WHERE e.user_id = $1
            GROUP BY e.course_id, c.title, c.slug, e.status, e.enrolled_at, e.completed_at
            ORDER BY e.enrolled_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
