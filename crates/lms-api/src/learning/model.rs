use serde::Serialize;
use uuid::Uuid;

/// Reasons recorded in the XP ledger
pub const XP_LESSON_COMPLETED: &str = "lesson_completed";
pub const XP_COURSE_COMPLETED: &str = "course_completed";
pub const XP_BADGE_AWARDED: &str = "badge_awarded";
pub const XP_CHALLENGE_COMPLETED: &str = "challenge_completed";

/// One XP grant made while handling a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpGrant {
    pub reason: &'static str,
    pub amount: i64,
    pub source_id: Uuid,
}

/// What completing a lesson changed for the learner.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    /// False when the lesson had already been completed; nothing else changed then.
    pub newly_completed: bool,
    pub course_completed: bool,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub current_streak: i32,
    pub badges_awarded: Vec<String>,
    pub challenges_completed: Vec<Uuid>,
    pub grants: Vec<XpGrant>,
}
