use axum::{
    Router,
    extract::State,
    routing::{delete, get, post, put},
};
use lms_db::{
    models::{Course, Series},
    repositories::{course as course_repo, ordering::SeriesCourses, series as series_repo},
};
use uuid::Uuid;

use super::{
    model::{AddCourseRequest, CreateSeriesRequest, SeriesDetail, UpdateSeriesRequest},
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    ordering::{self, ReorderRequest},
    response::{ApiResponse, ApiResult},
    validation::{ValidatedJson, ValidatedPath, require_text_if_present},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/series", get(list_series).post(create_series))
        .route(
            "/series/{series_id}",
            get(get_series).patch(update_series).delete(delete_series),
        )
        .route("/series/{series_id}/courses", post(add_course))
        .route("/series/{series_id}/courses/order", put(reorder_courses))
        .route(
            "/series/{series_id}/courses/{course_id}",
            delete(remove_course),
        )
}

async fn list_series(State(state): State<ApiState>) -> ApiResult<Vec<Series>> {
    let series = series_repo::list(&state.pool).await?;
    Ok(ApiResponse::ok(series))
}

async fn get_series(
    State(state): State<ApiState>,
    ValidatedPath(series_id): ValidatedPath<Uuid>,
) -> ApiResult<SeriesDetail> {
    let series = series_repo::find_by_id(&state.pool, series_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Series"))?;
    let courses = course_repo::list_by_series(&state.pool, series_id).await?;

    Ok(ApiResponse::ok(SeriesDetail { series, courses }))
}

async fn create_series(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(req): ValidatedJson<CreateSeriesRequest>,
) -> ApiResult<Series> {
    auth_user.require_instructor()?;

    let series = service::create_series(&state.pool, &req).await?;
    Ok(ApiResponse::created(series))
}

async fn update_series(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(series_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSeriesRequest>,
) -> ApiResult<Series> {
    auth_user.require_instructor()?;
    require_text_if_present("title", req.title.as_deref())?;

    let series = series_repo::update(
        &state.pool,
        series_id,
        req.title.as_deref().map(str::trim),
        req.description.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Series"))?;

    Ok(ApiResponse::ok(series))
}

async fn delete_series(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(series_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    service::delete_series(&state.pool, series_id).await?;
    Ok(ApiResponse::empty())
}

async fn add_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(series_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddCourseRequest>,
) -> ApiResult<Vec<Course>> {
    auth_user.require_instructor()?;

    service::add_course(&state.pool, series_id, req.course_id).await?;

    let courses = course_repo::list_by_series(&state.pool, series_id).await?;
    Ok(ApiResponse::created(courses))
}

async fn remove_course(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath((series_id, course_id)): ValidatedPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    service::remove_course(&state.pool, series_id, course_id).await?;
    Ok(ApiResponse::empty())
}

async fn reorder_courses(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(series_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> ApiResult<Vec<Course>> {
    auth_user.require_instructor()?;

    ordering::reorder::<SeriesCourses>(&state.pool, series_id, &req.ordered_ids).await?;

    let courses = course_repo::list_by_series(&state.pool, series_id).await?;
    Ok(ApiResponse::ok(courses))
}
