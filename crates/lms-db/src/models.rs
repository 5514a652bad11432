use chrono::{DateTime, NaiveDate, Utc};
use lms_core::gamification::{BadgeCriterion, ChallengeMetric};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lesson_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Article,
    Quiz,
    Exercise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "relation_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Related,
    NextStep,
    Alternative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

/// Course row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub xp_reward: i32,
    pub series_id: Option<Uuid>,
    /// 1-based position inside the series, set together with `series_id`
    pub series_position: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Module row - a chapter of a course
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// 1-based, dense and unique within the course
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lesson row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub kind: LessonKind,
    pub duration_minutes: i32,
    pub xp_reward: i32,
    /// 1-based, dense and unique within the module
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a lesson sits and what finishing it is worth.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonContext {
    pub lesson_id: Uuid,
    pub module_id: Uuid,
    pub course_id: Uuid,
    pub lesson_xp: i32,
    pub course_xp: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Series {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A prerequisite of a course, with the required course's headline fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prerequisite {
    pub course_id: Uuid,
    pub prerequisite_course_id: Uuid,
    pub title: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseRelation {
    pub id: Uuid,
    pub source_course_id: Uuid,
    pub target_course_id: Uuid,
    pub relation_type: RelationType,
    pub target_title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// An enrollment with lesson completion counts for the learner dashboard
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrollmentProgress {
    pub course_id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_lessons: i64,
    pub total_lessons: i64,
}

/// Per-learner gamification counters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LearnerStats {
    pub user_id: Uuid,
    pub total_xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub lessons_completed: i32,
    pub courses_completed: i32,
}

impl LearnerStats {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            lessons_completed: 0,
            courses_completed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Badge {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub criterion: BadgeCriterion,
    pub threshold: i64,
    pub xp_bonus: i32,
    pub created_at: DateTime<Utc>,
}

/// A badge held by a learner
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AwardedBadge {
    pub badge_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub metric: ChallengeMetric,
    pub target: i64,
    pub xp_reward: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A learner's standing in a challenge they joined
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChallengeParticipation {
    pub challenge_id: Uuid,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub metric: ChallengeMetric,
    pub target: i64,
    pub xp_reward: i32,
    pub progress: i64,
    pub ends_at: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub xp: i64,
    pub level: i32,
}

/// Filters for the course catalog listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseFilter {
    pub status: Option<CourseStatus>,
    pub level: Option<CourseLevel>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
