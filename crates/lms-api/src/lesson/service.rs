use lms_db::{
    models::Lesson,
    repositories::{
        lesson as lesson_repo, module as module_repo,
        ordering::{self as ordering_repo, ModuleLessons},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::ApiError, metrics, ordering};

/// Move a lesson to the end of another module of the same course.
///
/// Both modules are locked (in id order, so two opposite moves cannot
/// deadlock), the lesson is appended to the target and the source module
/// is compacted.
pub async fn move_lesson(
    pool: &PgPool,
    lesson_id: Uuid,
    target_module_id: Uuid,
) -> Result<Lesson, ApiError> {
    let mut tx = pool.begin().await?;

    let lesson = lesson_repo::find_by_id(&mut *tx, lesson_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;
    let source = module_repo::find_by_id(&mut *tx, lesson.module_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Module"))?;
    let target = module_repo::find_by_id(&mut *tx, target_module_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Target module"))?;

    if source.id == target.id {
        return Err(ApiError::Validation(
            "Lesson is already in the target module".to_string(),
        ));
    }
    if source.course_id != target.course_id {
        return Err(ApiError::Validation(
            "Lessons can only move between modules of the same course".to_string(),
        ));
    }

    let (first, second) = if source.id < target.id {
        (source.id, target.id)
    } else {
        (target.id, source.id)
    };
    ordering::lock_parent::<ModuleLessons>(&mut tx, first).await?;
    ordering::lock_parent::<ModuleLessons>(&mut tx, second).await?;

    if ordering_repo::find_parent::<ModuleLessons>(&mut tx, lesson_id).await? != Some(source.id) {
        return Err(ApiError::Conflict(
            "lesson was moved concurrently, retry the request".to_string(),
        ));
    }

    let order = ordering::append_position::<ModuleLessons>(&mut tx, target.id).await?;
    let moved = lesson_repo::move_to_module(&mut *tx, lesson_id, target.id, order).await?;
    ordering::compact::<ModuleLessons>(&mut tx, source.id).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("lesson", "move", true);
    tracing::info!(
        lesson_id = %lesson_id,
        from_module = %source.id,
        to_module = %target.id,
        order,
        "lesson moved"
    );
    Ok(moved)
}
