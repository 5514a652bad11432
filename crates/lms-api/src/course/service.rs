use lms_core::slug::{slugify, with_suffix};
use lms_db::{
    models::{Course, CourseLevel, CourseStatus},
    repositories::{course as course_repo, ordering::SeriesCourses},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{CreateCourseRequest, DEFAULT_COURSE_XP};
use crate::{error::ApiError, ordering, validation::require_text};

/// Slug for `title`, or `fallback` when the title has nothing sluggable.
pub(crate) fn base_slug(title: &str, fallback: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// `slug` with a short random suffix, for retrying after a collision.
pub(crate) fn suffixed_slug(slug: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    with_suffix(slug, &id[..8])
}

pub async fn create_course(pool: &PgPool, req: &CreateCourseRequest) -> Result<Course, ApiError> {
    require_text("title", &req.title)?;
    let title = req.title.trim();

    let mut slug = base_slug(title, "course");
    if course_repo::slug_exists(pool, &slug).await? {
        slug = suffixed_slug(&slug);
    }

    let course = course_repo::create(
        pool,
        title,
        &slug,
        req.description.as_deref(),
        req.level.unwrap_or(CourseLevel::Beginner),
        req.xp_reward.unwrap_or(DEFAULT_COURSE_XP),
    )
    .await?;

    tracing::info!(course_id = %course.id, slug = %course.slug, "course created");
    Ok(course)
}

/// Delete a course that nobody is actively taking.
///
/// Modules, lessons and edges go with it; if it belonged to a series the
/// remaining series courses are renumbered.
pub async fn delete_course(pool: &PgPool, course_id: Uuid) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let series_id = course_repo::find_by_id(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?
        .series_id;

    if let Some(series_id) = series_id {
        ordering::lock_parent::<SeriesCourses>(&mut tx, series_id).await?;
    }

    let course = course_repo::find_by_id_for_update(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    if course.series_id != series_id {
        return Err(ApiError::Conflict(
            "Course series changed concurrently, retry the request".to_string(),
        ));
    }

    let active = course_repo::count_active_enrollments(&mut *tx, course_id).await?;
    if active > 0 {
        return Err(ApiError::Conflict(format!(
            "Course has {active} active enrollment(s) and cannot be deleted"
        )));
    }

    course_repo::delete(&mut *tx, course_id).await?;

    if let Some(series_id) = series_id {
        ordering::compact::<SeriesCourses>(&mut tx, series_id).await?;
    }

    tx.commit().await?;

    crate::metrics::record_ordering_operation("course", "delete", true);
    tracing::info!(course_id = %course_id, "course deleted");
    Ok(())
}

/// Move a draft course to `published`.
pub async fn publish_course(pool: &PgPool, course_id: Uuid) -> Result<Course, ApiError> {
    let mut tx = pool.begin().await?;

    let course = course_repo::find_by_id_for_update(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    match course.status {
        CourseStatus::Published => {
            return Err(ApiError::Conflict("Course is already published".to_string()));
        }
        CourseStatus::Archived => {
            return Err(ApiError::Conflict(
                "Archived courses cannot be published".to_string(),
            ));
        }
        CourseStatus::Draft => {}
    }

    if course_repo::count_lessons(&mut *tx, course_id).await? == 0 {
        return Err(ApiError::Validation(
            "Course needs at least one lesson before publishing".to_string(),
        ));
    }

    let course = course_repo::set_status(&mut *tx, course_id, CourseStatus::Published).await?;
    tx.commit().await?;

    tracing::info!(course_id = %course_id, "course published");
    Ok(course)
}

pub async fn archive_course(pool: &PgPool, course_id: Uuid) -> Result<Course, ApiError> {
    let mut tx = pool.begin().await?;

    let course = course_repo::find_by_id_for_update(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    if course.status == CourseStatus::Archived {
        return Err(ApiError::Conflict("Course is already archived".to_string()));
    }

    let course = course_repo::set_status(&mut *tx, course_id, CourseStatus::Archived).await?;
    tx.commit().await?;

    tracing::info!(course_id = %course_id, "course archived");
    Ok(course)
}
