use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use lms_db::{
    models::Lesson,
    repositories::{lesson as lesson_repo, module as module_repo, ordering::ModuleLessons},
};
use uuid::Uuid;

use super::{
    model::{CreateLessonRequest, MoveLessonRequest, UpdateLessonRequest},
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    metrics,
    ordering::{self, ReorderRequest},
    response::{ApiResponse, ApiResult},
    validation::{ValidatedJson, ValidatedPath, require_text, require_text_if_present},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/modules/{module_id}/lessons",
            get(list_lessons).post(create_lesson),
        )
        .route("/modules/{module_id}/lessons/order", put(reorder_lessons))
        .route(
            "/lessons/{lesson_id}",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/lessons/{lesson_id}/move", post(move_lesson))
}

async fn list_lessons(
    State(state): State<ApiState>,
    ValidatedPath(module_id): ValidatedPath<Uuid>,
) -> ApiResult<Vec<Lesson>> {
    if module_repo::find_by_id(&state.pool, module_id).await?.is_none() {
        return Err(ApiError::not_found("Module"));
    }

    let lessons = lesson_repo::list_by_module(&state.pool, module_id).await?;
    Ok(ApiResponse::ok(lessons))
}

async fn get_lesson(
    State(state): State<ApiState>,
    ValidatedPath(lesson_id): ValidatedPath<Uuid>,
) -> ApiResult<Lesson> {
    let lesson = lesson_repo::find_by_id(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;

    Ok(ApiResponse::ok(lesson))
}

/// Append a lesson at the end of the module
async fn create_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(module_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateLessonRequest>,
) -> ApiResult<Lesson> {
    auth_user.require_instructor()?;
    require_text("title", &req.title)?;

    let mut tx = state.pool.begin().await?;

    ordering::lock_parent::<ModuleLessons>(&mut tx, module_id).await?;
    let order = ordering::append_position::<ModuleLessons>(&mut tx, module_id).await?;
    let lesson = lesson_repo::create(&mut *tx, module_id, &req.as_new_lesson(), order).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("lesson", "append", true);
    tracing::info!(module_id = %module_id, lesson_id = %lesson.id, order, "lesson created");
    Ok(ApiResponse::created(lesson))
}

async fn update_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(lesson_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateLessonRequest>,
) -> ApiResult<Lesson> {
    auth_user.require_instructor()?;
    require_text_if_present("title", req.title.as_deref())?;

    let lesson = lesson_repo::update(&state.pool, lesson_id, &req.as_changes())
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;

    Ok(ApiResponse::ok(lesson))
}

async fn delete_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(lesson_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    let mut tx = state.pool.begin().await?;

    let module_id = ordering::lock_parent_of::<ModuleLessons>(&mut tx, lesson_id).await?;
    lesson_repo::delete(&mut *tx, lesson_id).await?;
    ordering::compact::<ModuleLessons>(&mut tx, module_id).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("lesson", "delete", true);
    tracing::info!(module_id = %module_id, lesson_id = %lesson_id, "lesson deleted");
    Ok(ApiResponse::empty())
}

async fn reorder_lessons(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(module_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> ApiResult<Vec<Lesson>> {
    auth_user.require_instructor()?;

    ordering::reorder::<ModuleLessons>(&state.pool, module_id, &req.ordered_ids).await?;

    let lessons = lesson_repo::list_by_module(&state.pool, module_id).await?;
    Ok(ApiResponse::ok(lessons))
}

async fn move_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(lesson_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<MoveLessonRequest>,
) -> ApiResult<Lesson> {
    auth_user.require_instructor()?;

    let lesson = service::move_lesson(&state.pool, lesson_id, req.target_module_id).await?;
    Ok(ApiResponse::ok(lesson))
}
