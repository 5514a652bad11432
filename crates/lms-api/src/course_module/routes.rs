use axum::{
    Router,
    extract::State,
    routing::{get, patch, put},
};
use lms_db::{
    models::Module,
    repositories::{course as course_repo, module as module_repo, ordering::CourseModules},
};
use uuid::Uuid;

use super::model::{CreateModuleRequest, UpdateModuleRequest};
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
            "/courses/{course_id}/modules",
            get(list_modules).post(create_module),
        )
        .route("/courses/{course_id}/modules/order", put(reorder_modules))
        .route(
            "/modules/{module_id}",
            patch(update_module).delete(delete_module),
        )
}

async fn list_modules(
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Vec<Module>> {
    if !course_repo::exists(&state.pool, course_id).await? {
        return Err(ApiError::not_found("Course"));
    }

    let modules = module_repo::list_by_course(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(modules))
}

/// Append a module at the end of the course
async fn create_module(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateModuleRequest>,
) -> ApiResult<Module> {
    auth_user.require_instructor()?;
    require_text("title", &req.title)?;

    let mut tx = state.pool.begin().await?;

    ordering::lock_parent::<CourseModules>(&mut tx, course_id).await?;
    let order = ordering::append_position::<CourseModules>(&mut tx, course_id).await?;

    let module = module_repo::create(
        &mut *tx,
        course_id,
        req.title.trim(),
        req.description.as_deref(),
        order,
    )
    .await?;

    tx.commit().await?;

    metrics::record_ordering_operation("module", "append", true);
    tracing::info!(course_id = %course_id, module_id = %module.id, order, "module created");
    Ok(ApiResponse::created(module))
}

async fn update_module(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(module_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateModuleRequest>,
) -> ApiResult<Module> {
    auth_user.require_instructor()?;
    require_text_if_present("title", req.title.as_deref())?;

    let module = module_repo::update(
        &state.pool,
        module_id,
        req.title.as_deref().map(str::trim),
        req.description.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Module"))?;

    Ok(ApiResponse::ok(module))
}

/// Delete a module with its lessons and close the gap in the course
async fn delete_module(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(module_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    let mut tx = state.pool.begin().await?;

    let course_id = ordering::lock_parent_of::<CourseModules>(&mut tx, module_id).await?;
    module_repo::delete(&mut *tx, module_id).await?;
    ordering::compact::<CourseModules>(&mut tx, course_id).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("module", "delete", true);
    tracing::info!(course_id = %course_id, module_id = %module_id, "module deleted");
    Ok(ApiResponse::empty())
}

async fn reorder_modules(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> ApiResult<Vec<Module>> {
    auth_user.require_instructor()?;

    ordering::reorder::<CourseModules>(&state.pool, course_id, &req.ordered_ids).await?;

    let modules = module_repo::list_by_course(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(modules))
}
