use lms_db::{
    models::LessonKind,
    repositories::lesson::{LessonChanges, NewLesson},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// XP granted for finishing a lesson when the author does not set one
pub const DEFAULT_LESSON_XP: i32 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 100_000))]
    pub content: Option<String>,
    pub kind: Option<LessonKind>,
    #[validate(range(min = 0, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 10_000))]
    pub xp_reward: Option<i32>,
}

impl CreateLessonRequest {
    pub fn as_new_lesson(&self) -> NewLesson<'_> {
        NewLesson {
            title: self.title.trim(),
            content: self.content.as_deref(),
            kind: self.kind.unwrap_or(LessonKind::Article),
            duration_minutes: self.duration_minutes.unwrap_or(0),
            xp_reward: self.xp_reward.unwrap_or(DEFAULT_LESSON_XP),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 100_000))]
    pub content: Option<String>,
    pub kind: Option<LessonKind>,
    #[validate(range(min = 0, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 10_000))]
    pub xp_reward: Option<i32>,
}

impl UpdateLessonRequest {
    pub fn as_changes(&self) -> LessonChanges<'_> {
        LessonChanges {
            title: self.title.as_deref().map(str::trim),
            content: self.content.as_deref(),
            kind: self.kind,
            duration_minutes: self.duration_minutes,
            xp_reward: self.xp_reward,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MoveLessonRequest {
    pub target_module_id: Uuid,
}
