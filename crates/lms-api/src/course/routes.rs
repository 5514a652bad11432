use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use lms_db::{
    models::{Course, CourseFilter},
    repositories::{course as course_repo, lesson as lesson_repo, module as module_repo},
};
use uuid::Uuid;

use super::{
    model::{
        CourseDetail, CourseListQuery, CreateCourseRequest, UpdateCourseRequest, build_outline,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    response::{ApiResponse, ApiResult, Page},
    validation::{
        ValidatedJson, ValidatedPath, ValidatedQuery, pagination, require_text_if_present,
    },
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{course_id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{course_id}/publish", post(publish_course))
        .route("/courses/{course_id}/archive", post(archive_course))
}

async fn list_courses(
    State(state): State<ApiState>,
    ValidatedQuery(query): ValidatedQuery<CourseListQuery>,
) -> ApiResult<Page<Course>> {
    let (limit, offset) = pagination(query.page, query.per_page)?;

    let filter = CourseFilter {
        status: query.status,
        level: query.level,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        limit,
        offset,
    };

    let items = course_repo::list(&state.pool, &filter).await?;
    let total = course_repo::count(&state.pool, &filter).await?;

    Ok(ApiResponse::ok(Page {
        items,
        page: query.page.unwrap_or(1),
        per_page: limit,
        total,
    }))
}

async fn get_course(
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<CourseDetail> {
    let course = course_repo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    let modules = module_repo::list_by_course(&state.pool, course_id).await?;
    let lessons = lesson_repo::list_by_course(&state.pool, course_id).await?;

    Ok(ApiResponse::ok(CourseDetail {
        course,
        modules: build_outline(modules, lessons),
    }))
}

async fn create_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(req): ValidatedJson<CreateCourseRequest>,
) -> ApiResult<Course> {
    auth_user.require_instructor()?;

    let course = service::create_course(&state.pool, &req).await?;
    Ok(ApiResponse::created(course))
}

async fn update_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCourseRequest>,
) -> ApiResult<Course> {
    auth_user.require_instructor()?;
    require_text_if_present("title", req.title.as_deref())?;

    let course = course_repo::update(
        &state.pool,
        course_id,
        req.title.as_deref().map(str::trim),
        req.description.as_deref(),
        req.level,
        req.xp_reward,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Course"))?;

    Ok(ApiResponse::ok(course))
}

async fn delete_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    service::delete_course(&state.pool, course_id).await?;
    Ok(ApiResponse::empty())
}

async fn publish_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Course> {
    auth_user.require_instructor()?;

    let course = service::publish_course(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(course))
}

async fn archive_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Course> {
    auth_user.require_instructor()?;

    let course = service::archive_course(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(course))
}
