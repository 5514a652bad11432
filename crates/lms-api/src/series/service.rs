use lms_db::{
    models::Series,
    repositories::{course as course_repo, ordering::SeriesCourses, series as series_repo},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::model::CreateSeriesRequest;
use crate::{
    course::service::{base_slug, suffixed_slug},
    error::ApiError,
    metrics, ordering,
    validation::require_text,
};

pub async fn create_series(pool: &PgPool, req: &CreateSeriesRequest) -> Result<Series, ApiError> {
    require_text("title", &req.title)?;
    let title = req.title.trim();

    let mut slug = base_slug(title, "series");
    if series_repo::slug_exists(pool, &slug).await? {
        slug = suffixed_slug(&slug);
    }

    let series = series_repo::create(pool, title, &slug, req.description.as_deref()).await?;

    tracing::info!(series_id = %series.id, slug = %series.slug, "series created");
    Ok(series)
}

/// Delete a series. Its courses stay in the catalog, detached.
pub async fn delete_series(pool: &PgPool, series_id: Uuid) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    ordering::lock_parent::<SeriesCourses>(&mut tx, series_id).await?;
    let detached = series_repo::detach_all(&mut *tx, series_id).await?;
    series_repo::delete(&mut *tx, series_id).await?;

    tx.commit().await?;

    tracing::info!(series_id = %series_id, detached, "series deleted");
    Ok(())
}

/// Append a course to a series. A course belongs to at most one series.
pub async fn add_course(pool: &PgPool, series_id: Uuid, course_id: Uuid) -> Result<i32, ApiError> {
    let mut tx = pool.begin().await?;

    ordering::lock_parent::<SeriesCourses>(&mut tx, series_id).await?;

    let course = course_repo::find_by_id_for_update(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    match course.series_id {
        Some(current) if current == series_id => {
            return Err(ApiError::Conflict(
                "Course is already part of this series".to_string(),
            ));
        }
        Some(_) => {
            return Err(ApiError::Conflict(
                "Course already belongs to another series".to_string(),
            ));
        }
        None => {}
    }

    let position = ordering::append_position::<SeriesCourses>(&mut tx, series_id).await?;
    series_repo::attach_course(&mut *tx, series_id, course_id, position).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("course", "append", true);
    tracing::info!(series_id = %series_id, course_id = %course_id, position, "course added to series");
    Ok(position)
}

/// Take a course out of a series and close the gap.
pub async fn remove_course(pool: &PgPool, series_id: Uuid, course_id: Uuid) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    ordering::lock_parent::<SeriesCourses>(&mut tx, series_id).await?;

    if !series_repo::detach_course(&mut *tx, series_id, course_id).await? {
        return Err(ApiError::NotFound(
            "Course is not part of this series".to_string(),
        ));
    }
    ordering::compact::<SeriesCourses>(&mut tx, series_id).await?;

    tx.commit().await?;

    metrics::record_ordering_operation("course", "delete", true);
    tracing::info!(series_id = %series_id, course_id = %course_id, "course removed from series");
    Ok(())
}
