use axum::{
    Router,
    extract::State,
    routing::post,
};
use chrono::Utc;
use lms_db::models::Enrollment;
use uuid::Uuid;

use super::{model::CompletionOutcome, service};
use crate::{
    ApiState,
    auth::AuthUser,
    response::{ApiResponse, ApiResult},
    validation::ValidatedPath,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/courses/{course_id}/enroll", post(enroll))
        .route("/courses/{course_id}/drop", post(drop_course))
        .route("/lessons/{lesson_id}/complete", post(complete_lesson))
}

async fn enroll(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Enrollment> {
    let (enrollment, created) = service::enroll(&state.pool, auth_user.user_id, course_id).await?;

    if created {
        Ok(ApiResponse::created(enrollment))
    } else {
        Ok(ApiResponse::ok(enrollment))
    }
}

async fn drop_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Enrollment> {
    let enrollment = service::drop_enrollment(&state.pool, auth_user.user_id, course_id).await?;
    Ok(ApiResponse::ok(enrollment))
}

async fn complete_lesson(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(lesson_id): ValidatedPath<Uuid>,
) -> ApiResult<CompletionOutcome> {
    let outcome =
        service::complete_lesson(&state.pool, auth_user.user_id, lesson_id, Utc::now()).await?;
    Ok(ApiResponse::ok(outcome))
}
