use chrono::{DateTime, Utc};
use lms_core::gamification::ChallengeMetric;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Challenge, ChallengeParticipation};

/// Fields accepted when creating a challenge
#[derive(Debug, Clone)]
pub struct NewChallenge<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub metric: ChallengeMetric,
    pub target: i64,
    pub xp_reward: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Challenges that have not ended at `now`, soonest ending first.
pub async fn list_open<'e, E>(executor: E, now: DateTime<Utc>) -> Result<Vec<Challenge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, description, metric, target, xp_reward, starts_at, ends_at, created_at
            FROM challenges
            WHERE ends_at > $1
            ORDER BY ends_at ASC, id
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    challenge_id: Uuid,
) -> Result<Option<Challenge>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, description, metric, target, xp_reward, starts_at, ends_at, created_at
            FROM challenges
            WHERE id = $1
        "#,
    )
    .bind(challenge_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    challenge: &NewChallenge<'_>,
) -> Result<Challenge, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO challenges (title, description, metric, target, xp_reward, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, metric, target, xp_reward, starts_at, ends_at, created_at
        "#,
    )
    .bind(challenge.title)
    .bind(challenge.description)
    .bind(challenge.metric.as_str())
    .bind(challenge.target)
    .bind(challenge.xp_reward)
    .bind(challenge.starts_at)
    .bind(challenge.ends_at)
    .fetch_one(executor)
    .await
}

/// Returns `false` if the learner had already joined.
pub async fn join<'e, E>(executor: E, user_id: Uuid, challenge_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO challenge_participants (user_id, challenge_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, challenge_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(challenge_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Joined, unfinished challenges whose window contains `now`, locked for update.
pub async fn lock_in_progress<'e, E>(
    executor: E,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<ChallengeParticipation>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id AS challenge_id, c.title, c.metric, c.target, c.xp_reward,
                   cp.progress, c.ends_at, cp.joined_at, cp.completed_at
            FROM challenge_participants cp
            JOIN challenges c ON c.id = cp.challenge_id
            WHERE cp.user_id = $1
              AND cp.completed_at IS NULL
              AND c.starts_at <= $2
              AND c.ends_at > $2
            ORDER BY c.ends_at ASC
            FOR UPDATE OF cp
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(executor)
    .await
}

pub async fn update_progress<'e, E>(
    executor: E,
    user_id: Uuid,
    challenge_id: Uuid,
    progress: i64,
    completed: bool,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE challenge_participants
            SET progress = $3,
                completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END
            WHERE user_id = $1 AND challenge_id = $2
        "#,
    )
    .bind(user_id)
    .bind(challenge_id)
    .bind(progress)
    .bind(completed)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_participations<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<ChallengeParticipation>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT c.id AS challenge_id, c.title, c.metric, c.target, c.xp_reward,
                   cp.progress, c.ends_at, cp.joined_at, cp.completed_at
            FROM challenge_participants cp
            JOIN challenges c ON c.id = cp.challenge_id
            WHERE cp.user_id = $1
            ORDER BY cp.joined_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
