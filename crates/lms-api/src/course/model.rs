use lms_db::models::{Course, CourseLevel, CourseStatus, Lesson, Module};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// XP granted for finishing a course when the author does not set one
pub const DEFAULT_COURSE_XP: i32 = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0, max = 100_000))]
    pub xp_reward: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0, max = 100_000))]
    pub xp_reward: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    pub status: Option<CourseStatus>,
    pub level: Option<CourseLevel>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A module with its lessons in order
#[derive(Debug, Serialize)]
pub struct ModuleOutline {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

/// A course with its full module/lesson outline
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
}

/// Group lessons under their modules, keeping both in the given order.
///
/// Lessons whose module is not in `modules` are dropped.
pub fn build_outline(modules: Vec<Module>, lessons: Vec<Lesson>) -> Vec<ModuleOutline> {
    let mut outline: Vec<ModuleOutline> = modules
        .into_iter()
        .map(|module| ModuleOutline {
            module,
            lessons: Vec::new(),
        })
        .collect();

    for lesson in lessons {
        if let Some(entry) = outline.iter_mut().find(|m| m.module.id == lesson.module_id) {
            entry.lessons.push(lesson);
        }
    }

    outline
}
