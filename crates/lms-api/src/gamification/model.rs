use chrono::{DateTime, Utc};
use lms_core::gamification::{BadgeCriterion, ChallengeMetric, LeaderboardPeriod, LevelProgress};
use lms_db::models::{
    AwardedBadge, ChallengeParticipation, EnrollmentProgress, LeaderboardEntry, LearnerStats,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

/// Leaderboard size when the caller does not ask for one
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBadgeRequest {
    #[validate(length(min = 1, max = 64, message = "code must be 1-64 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub criterion: BadgeCriterion,
    #[validate(range(min = 1, message = "threshold must be positive"))]
    pub threshold: i64,
    #[validate(range(min = 0, max = 100_000))]
    pub xp_bonus: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub metric: ChallengeMetric,
    #[validate(range(min = 1, message = "target must be positive"))]
    pub target: i64,
    #[validate(range(min = 0, max = 100_000))]
    pub xp_reward: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl CreateChallengeRequest {
    pub fn check_window(&self) -> Result<(), ApiError> {
        if self.starts_at >= self.ends_at {
            return Err(ApiError::Validation(
                "starts_at must be before ends_at".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub period: LeaderboardPeriod,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub period: LeaderboardPeriod,
    pub entries: Vec<LeaderboardEntry>,
}

/// Everything the learner dashboard shows
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub stats: LearnerStats,
    pub level: LevelProgress,
    pub badges: Vec<AwardedBadge>,
    pub challenges: Vec<ChallengeParticipation>,
    pub enrollments: Vec<EnrollmentProgress>,
}

/// Requested leaderboard size, defaulted and bounded by `max`.
pub fn leaderboard_limit(requested: Option<i64>, max: i64) -> Result<i64, ApiError> {
    let limit = requested.unwrap_or(DEFAULT_LEADERBOARD_LIMIT.min(max));
    if !(1..=max).contains(&limit) {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {max}"
        )));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_leaderboard_limit() {
        assert_eq!(leaderboard_limit(None, 100).unwrap(), DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(leaderboard_limit(Some(100), 100).unwrap(), 100);
        assert_eq!(leaderboard_limit(None, 5).unwrap(), 5);
        assert!(leaderboard_limit(Some(0), 100).is_err());
        assert!(leaderboard_limit(Some(101), 100).is_err());
    }

    #[test]
    fn test_challenge_window() {
        let now = Utc::now();
        let req = |starts_at, ends_at| CreateChallengeRequest {
            title: "Week of Rust".to_string(),
            description: None,
            metric: ChallengeMetric::LessonsCompleted,
            target: 5,
            xp_reward: None,
            starts_at,
            ends_at,
        };

        assert!(req(now, now + Duration::days(7)).check_window().is_ok());
        assert!(req(now, now).check_window().is_err());
        assert!(req(now, now - Duration::hours(1)).check_window().is_err());
    }

    #[test]
    fn test_badge_request_parsing() {
        let req: CreateBadgeRequest = serde_json::from_value(serde_json::json!({
            "code": "first-steps",
            "name": "First steps",
            "criterion": "lessons_completed",
            "threshold": 1
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.criterion, BadgeCriterion::LessonsCompleted);

        let zero: CreateBadgeRequest = serde_json::from_value(serde_json::json!({
            "code": "none",
            "name": "None",
            "criterion": "total_xp",
            "threshold": 0
        }))
        .unwrap();
        assert!(zero.validate().is_err());
    }
}
