use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{LeaderboardEntry, LearnerStats};

const STATS_COLUMNS: &str = r#"
    user_id, total_xp, level, current_streak, longest_streak, last_activity_date,
    lessons_completed, courses_completed
"#;

pub async fn find<'e, E>(executor: E, user_id: Uuid) -> Result<Option<LearnerStats>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {STATS_COLUMNS} FROM learner_stats WHERE user_id = $1");

    sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Create the counters row if missing so it can be locked.
pub async fn ensure_row<'e, E>(executor: E, user_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO learner_stats (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Lock the learner's counters for the rest of the transaction.
pub async fn lock<'e, E>(executor: E, user_id: Uuid) -> Result<LearnerStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {STATS_COLUMNS} FROM learner_stats WHERE user_id = $1 FOR UPDATE");

    sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn save<'e, E>(executor: E, stats: &LearnerStats) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE learner_stats
            SET total_xp = $2,
                level = $3,
                current_streak = $4,
                longest_streak = $5,
                last_activity_date = $6,
                lessons_completed = $7,
                courses_completed = $8,
                updated_at = NOW()
            WHERE user_id = $1
        "#,
    )
    .bind(stats.user_id)
    .bind(stats.total_xp)
    .bind(stats.level)
    .bind(stats.current_streak)
    .bind(stats.longest_streak)
    .bind(stats.last_activity_date)
    .bind(stats.lessons_completed)
    .bind(stats.courses_completed)
    .execute(executor)
    .await?;

    Ok(())
}

/// Append to the XP ledger the weekly leaderboard is computed from.
pub async fn insert_xp_event<'e, E>(
    executor: E,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    source_id: Option<Uuid>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO xp_events (user_id, amount, reason, source_id)
            VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(source_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Top learners by lifetime XP, dense-ranked.
pub async fn leaderboard_all_time<'e, E>(
    executor: E,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT DENSE_RANK() OVER (ORDER BY total_xp DESC) AS rank,
                   user_id,
                   total_xp AS xp,
                   level
            FROM learner_stats
            WHERE total_xp > 0
            ORDER BY total_xp DESC, user_id
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Top learners by XP earned since `since`, dense-ranked.
pub async fn leaderboard_since<'e, E>(
    executor: E,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH earned AS (
                SELECT user_id, SUM(amount)::BIGINT AS xp
                FROM xp_events
                WHERE created_at >= $1
                GROUP BY user_id
                HAVING SUM(amount) > 0
            )
            SELECT DENSE_RANK() OVER (ORDER BY e.xp DESC) AS rank,
                   e.user_id,
                   e.xp,
                   COALESCE(s.level, 1) AS level
            FROM earned e
            LEFT JOIN learner_stats s ON s.user_id = e.user_id
            ORDER BY e.xp DESC, e.user_id
            LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(executor)
    .await
}
