use lms_core::gamification::BadgeCriterion;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AwardedBadge, Badge};

pub async fn list<'e, E>(executor: E) -> Result<Vec<Badge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code, name, description, criterion, threshold, xp_bonus, created_at
            FROM badges
            ORDER BY criterion ASC, threshold ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    code: &str,
    name: &str,
    description: Option<&str>,
    criterion: BadgeCriterion,
    threshold: i64,
    xp_bonus: i32,
) -> Result<Badge, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO badges (code, name, description, criterion, threshold, xp_bonus)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, code, name, description, criterion, threshold, xp_bonus, created_at
        "#,
    )
    .bind(code)
    .bind(name)
    .bind(description)
    .bind(criterion.as_str())
    .bind(threshold)
    .bind(xp_bonus)
    .fetch_one(executor)
    .await
}

/// Badges the learner does not hold yet.
pub async fn list_unearned<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Badge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT b.id, b.code, b.name, b.description, b.criterion, b.threshold, b.xp_bonus, b.created_at
            FROM badges b
            WHERE NOT EXISTS (
                SELECT 1 FROM user_badges ub
                WHERE ub.badge_id = b.id AND ub.user_id = $1
            )
            ORDER BY b.threshold ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Returns `false` if the learner already held the badge.
pub async fn award<'e, E>(executor: E, user_id: Uuid, badge_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO user_badges (user_id, badge_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, badge_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_awarded<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<AwardedBadge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT b.id AS badge_id, b.code, b.name, b.description, ub.awarded_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.awarded_at ASC, b.code ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
