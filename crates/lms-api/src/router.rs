use axum::{Router, http::StatusCode, routing::get};

use crate::{
    course, course_module, error::ApiError, gamification, graph, learning, lesson, series,
    state::ApiState, storage,
};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(course::routes())
        .merge(course_module::routes())
        .merge(lesson::routes())
        .merge(series::routes())
        .merge(graph::routes())
        .merge(learning::routes())
        .merge(gamification::routes())
        .merge(storage::routes())
        .fallback(handler_404)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> ApiError {
    ApiError::NotFound("The requested resource was not found".to_string())
}
