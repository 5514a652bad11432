use chrono::{DateTime, Duration, Utc};
use lms_core::gamification::{LeaderboardPeriod, Streak, level_progress};
use lms_db::{
    models::{LeaderboardEntry, LearnerStats},
    repositories::{
        badge as badge_repo, challenge as challenge_repo, enrollment as enrollment_repo,
        stats as stats_repo,
    },
};
use sqlx::PgPool;
use uuid::Uuid;

use super::model::ProgressView;
use crate::error::ApiError;

/// Window of the weekly leaderboard
const WEEKLY_WINDOW_DAYS: i64 = 7;

pub async fn progress_view(
    pool: &PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ProgressView, ApiError> {
    let mut stats = stats_repo::find(pool, user_id)
        .await?
        .unwrap_or_else(|| LearnerStats::empty(user_id));

    // A streak only shows as current while it can still be extended.
    let streak = Streak {
        current: stats.current_streak,
        longest: stats.longest_streak,
        last_activity: stats.last_activity_date,
    }
    .as_of(now.date_naive());
    stats.current_streak = streak.current;

    let badges = badge_repo::list_awarded(pool, user_id).await?;
    let challenges = challenge_repo::list_participations(pool, user_id).await?;
    let enrollments = enrollment_repo::list_progress(pool, user_id).await?;

    Ok(ProgressView {
        level: level_progress(stats.total_xp),
        stats,
        badges,
        challenges,
        enrollments,
    })
}

pub async fn join_challenge(
    pool: &PgPool,
    user_id: Uuid,
    challenge_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    let challenge = challenge_repo::find_by_id(pool, challenge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge"))?;

    if now >= challenge.ends_at {
        return Err(ApiError::Conflict("Challenge has already ended".to_string()));
    }

    if !challenge_repo::join(pool, user_id, challenge_id).await? {
        return Err(ApiError::Conflict(
            "Already joined this challenge".to_string(),
        ));
    }

    tracing::info!(user_id = %user_id, challenge_id = %challenge_id, "challenge joined");
    Ok(())
}

pub async fn leaderboard(
    pool: &PgPool,
    period: LeaderboardPeriod,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<LeaderboardEntry>, ApiError> {
    let entries = match period {
        LeaderboardPeriod::All => stats_repo::leaderboard_all_time(pool, limit).await?,
        LeaderboardPeriod::Weekly => {
            let since = now - Duration::days(WEEKLY_WINDOW_DAYS);
            stats_repo::leaderboard_since(pool, since, limit).await?
        }
    };

    Ok(entries)
}
