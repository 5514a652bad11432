use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use lms_db::{
    models::{CourseRelation, Prerequisite},
    repositories::{course as course_repo, graph as graph_repo},
};
use uuid::Uuid;

use super::{
    model::{AddPrerequisiteRequest, AddRelationRequest},
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    response::{ApiResponse, ApiResult},
    validation::{ValidatedJson, ValidatedPath},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/courses/{course_id}/prerequisites",
            get(list_prerequisites).post(add_prerequisite),
        )
        .route(
            "/courses/{course_id}/prerequisites/{prerequisite_id}",
            delete(remove_prerequisite),
        )
        .route(
            "/courses/{course_id}/relations",
            get(list_relations).post(add_relation),
        )
        .route("/relations/{relation_id}", delete(remove_relation))
}

async fn list_prerequisites(
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Vec<Prerequisite>> {
    if !course_repo::exists(&state.pool, course_id).await? {
        return Err(ApiError::not_found("Course"));
    }

    let prerequisites = graph_repo::list_prerequisites(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(prerequisites))
}

async fn add_prerequisite(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddPrerequisiteRequest>,
) -> ApiResult<Prerequisite> {
    auth_user.require_instructor()?;

    let prerequisite =
        service::add_prerequisite(&state.pool, course_id, req.prerequisite_course_id).await?;
    Ok(ApiResponse::created(prerequisite))
}

async fn remove_prerequisite(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath((course_id, prerequisite_id)): ValidatedPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    if !graph_repo::delete_prerequisite(&state.pool, course_id, prerequisite_id).await? {
        return Err(ApiError::not_found("Prerequisite"));
    }

    tracing::info!(
        course_id = %course_id,
        prerequisite_course_id = %prerequisite_id,
        "prerequisite removed"
    );
    Ok(ApiResponse::empty())
}

async fn list_relations(
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
) -> ApiResult<Vec<CourseRelation>> {
    if !course_repo::exists(&state.pool, course_id).await? {
        return Err(ApiError::not_found("Course"));
    }

    let relations = graph_repo::list_relations(&state.pool, course_id).await?;
    Ok(ApiResponse::ok(relations))
}

async fn add_relation(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(course_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<AddRelationRequest>,
) -> ApiResult<CourseRelation> {
    auth_user.require_instructor()?;

    let relation = service::add_relation(
        &state.pool,
        course_id,
        req.target_course_id,
        req.relation_type,
    )
    .await?;
    Ok(ApiResponse::created(relation))
}

async fn remove_relation(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedPath(relation_id): ValidatedPath<Uuid>,
) -> ApiResult<()> {
    auth_user.require_instructor()?;

    if !graph_repo::delete_relation(&state.pool, relation_id).await? {
        return Err(ApiError::not_found("Relation"));
    }

    tracing::info!(relation_id = %relation_id, "relation removed");
    Ok(ApiResponse::empty())
}
