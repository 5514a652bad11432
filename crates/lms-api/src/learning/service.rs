//! Enrollment and lesson completion.
//!
//! A completion is the only thing that earns XP, so it is also where
//! streaks, course completion, challenges and badges are settled. All of it
//! happens in one transaction holding the learner's stats row lock.

use chrono::{DateTime, Utc};
use lms_core::gamification::{
    ActivityDelta, BadgeRule, LearnerSnapshot, Streak, advance_challenge, evaluate_badges,
    level_for_xp,
};
use lms_db::{
    models::{CourseStatus, Enrollment, EnrollmentStatus, LearnerStats},
    repositories::{
        badge as badge_repo, challenge as challenge_repo, course as course_repo,
        enrollment as enrollment_repo, lesson as lesson_repo, stats as stats_repo,
    },
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::model::{
    CompletionOutcome, XP_BADGE_AWARDED, XP_CHALLENGE_COMPLETED, XP_COURSE_COMPLETED,
    XP_LESSON_COMPLETED, XpGrant,
};
use crate::{error::ApiError, metrics};

/// Enroll the learner. Returns the enrollment and whether it is new
/// (`false` when a dropped enrollment was reactivated).
pub async fn enroll(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<(Enrollment, bool), ApiError> {
    let mut tx = pool.begin().await?;

    let course = course_repo::find_by_id(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    if course.status != CourseStatus::Published {
        return Err(ApiError::Conflict(
            "Only published courses accept enrollments".to_string(),
        ));
    }

    let existing = enrollment_repo::find_for_update(&mut *tx, user_id, course_id).await?;
    match existing.as_ref().map(|e| e.status) {
        Some(EnrollmentStatus::Active) => {
            return Err(ApiError::Conflict(
                "Already enrolled in this course".to_string(),
            ));
        }
        Some(EnrollmentStatus::Completed) => {
            return Err(ApiError::Conflict(
                "This course is already completed".to_string(),
            ));
        }
        Some(EnrollmentStatus::Dropped) | None => {}
    }

    let missing = enrollment_repo::missing_prerequisites(&mut *tx, user_id, course_id).await?;
    if !missing.is_empty() {
        let titles: Vec<&str> = missing.iter().map(|p| p.title.as_str()).collect();
        return Err(ApiError::Conflict(format!(
            "Complete the prerequisite courses first: {}",
            titles.join(", ")
        )));
    }

    let (enrollment, created) = if existing.is_some() {
        (enrollment_repo::reactivate(&mut *tx, user_id, course_id).await?, false)
    } else {
        (enrollment_repo::insert(&mut *tx, user_id, course_id).await?, true)
    };

    tx.commit().await?;

    tracing::info!(user_id = %user_id, course_id = %course_id, created, "learner enrolled");
    Ok((enrollment, created))
}

pub async fn drop_enrollment(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, ApiError> {
    let enrollment = enrollment_repo::drop_active(pool, user_id, course_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No active enrollment for this course".to_string())
        })?;

    tracing::info!(user_id = %user_id, course_id = %course_id, "enrollment dropped");
    Ok(enrollment)
}

/// Mark a lesson completed and settle everything it earns.
///
/// Completing a lesson twice changes nothing the second time.
pub async fn complete_lesson(
    pool: &PgPool,
    user_id: Uuid,
    lesson_id: Uuid,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, ApiError> {
    let mut tx = pool.begin().await?;

    let lesson = lesson_repo::find_context(&mut *tx, lesson_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson"))?;

    let enrollment = enrollment_repo::find_for_update(&mut *tx, user_id, lesson.course_id)
        .await?
        .filter(|e| e.status != EnrollmentStatus::Dropped)
        .ok_or_else(|| {
            ApiError::Forbidden("Enroll in the course before completing its lessons".to_string())
        })?;

    stats_repo::ensure_row(&mut *tx, user_id).await?;
    let mut stats = stats_repo::lock(&mut *tx, user_id).await?;

    let mut outcome = CompletionOutcome {
        lesson_id,
        course_id: lesson.course_id,
        newly_completed: false,
        course_completed: false,
        xp_awarded: 0,
        total_xp: stats.total_xp,
        level: stats.level,
        leveled_up: false,
        current_streak: stats.current_streak,
        badges_awarded: Vec::new(),
        challenges_completed: Vec::new(),
        grants: Vec::new(),
    };

    if !enrollment_repo::insert_lesson_completion(&mut *tx, user_id, lesson_id).await? {
        tx.commit().await?;
        tracing::debug!(user_id = %user_id, lesson_id = %lesson_id, "lesson already completed");
        return Ok(outcome);
    }
    outcome.newly_completed = true;

    let previous_level = stats.level;
    let streak = Streak {
        current: stats.current_streak,
        longest: stats.longest_streak,
        last_activity: stats.last_activity_date,
    }
    .record_activity(now.date_naive());
    stats.current_streak = streak.current;
    stats.longest_streak = streak.longest;
    stats.last_activity_date = streak.last_activity;
    stats.lessons_completed += 1;

    grant(
        &mut stats,
        &mut outcome,
        XP_LESSON_COMPLETED,
        i64::from(lesson.lesson_xp),
        lesson_id,
    );

    if enrollment.status == EnrollmentStatus::Active
        && enrollment_repo::count_remaining_lessons(&mut *tx, user_id, lesson.course_id).await?
            == 0
    {
        enrollment_repo::mark_completed(&mut *tx, user_id, lesson.course_id).await?;
        stats.courses_completed += 1;
        outcome.course_completed = true;
        grant(
            &mut stats,
            &mut outcome,
            XP_COURSE_COMPLETED,
            i64::from(lesson.course_xp),
            lesson.course_id,
        );
    }

    let delta = ActivityDelta {
        lessons_completed: 1,
        xp_earned: outcome.xp_awarded,
        current_streak: stats.current_streak,
    };
    advance_challenges(&mut tx, user_id, now, delta, &mut stats, &mut outcome).await?;
    award_badges(&mut tx, user_id, &mut stats, &mut outcome).await?;

    stats.level = level_for_xp(stats.total_xp);
    stats_repo::save(&mut *tx, &stats).await?;

    for g in &outcome.grants {
        stats_repo::insert_xp_event(&mut *tx, user_id, g.amount, g.reason, Some(g.source_id))
            .await?;
    }

    tx.commit().await?;

    outcome.total_xp = stats.total_xp;
    outcome.level = stats.level;
    outcome.leveled_up = stats.level > previous_level;
    outcome.current_streak = stats.current_streak;

    for g in &outcome.grants {
        metrics::record_xp_awarded(g.reason, g.amount);
    }
    metrics::record_badges_awarded(outcome.badges_awarded.len());

    tracing::info!(
        user_id = %user_id,
        lesson_id = %lesson_id,
        xp = outcome.xp_awarded,
        course_completed = outcome.course_completed,
        badges = outcome.badges_awarded.len(),
        "lesson completed"
    );
    Ok(outcome)
}

fn grant(
    stats: &mut LearnerStats,
    outcome: &mut CompletionOutcome,
    reason: &'static str,
    amount: i64,
    source_id: Uuid,
) {
    if amount <= 0 {
        return;
    }

    stats.total_xp += amount;
    outcome.xp_awarded += amount;
    outcome.grants.push(XpGrant {
        reason,
        amount,
        source_id,
    });
}

async fn advance_challenges(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
    delta: ActivityDelta,
    stats: &mut LearnerStats,
    outcome: &mut CompletionOutcome,
) -> Result<(), ApiError> {
    let open = challenge_repo::lock_in_progress(&mut *conn, user_id, now).await?;

    for participation in open {
        let advanced = advance_challenge(
            participation.metric,
            participation.target,
            participation.progress,
            delta,
        );

        if advanced.progress == participation.progress && !advanced.completed_now {
            continue;
        }

        challenge_repo::update_progress(
            &mut *conn,
            user_id,
            participation.challenge_id,
            advanced.progress,
            advanced.completed_now,
        )
        .await?;

        if advanced.completed_now {
            outcome.challenges_completed.push(participation.challenge_id);
            grant(
                stats,
                outcome,
                XP_CHALLENGE_COMPLETED,
                i64::from(participation.xp_reward),
                participation.challenge_id,
            );
        }
    }

    Ok(())
}

async fn award_badges(
    conn: &mut PgConnection,
    user_id: Uuid,
    stats: &mut LearnerStats,
    outcome: &mut CompletionOutcome,
) -> Result<(), ApiError> {
    let unearned = badge_repo::list_unearned(&mut *conn, user_id).await?;
    if unearned.is_empty() {
        return Ok(());
    }

    let rules: Vec<BadgeRule> = unearned
        .iter()
        .map(|b| BadgeRule {
            badge_id: b.id,
            criterion: b.criterion,
            threshold: b.threshold,
            xp_bonus: i64::from(b.xp_bonus),
        })
        .collect();

    let snapshot = LearnerSnapshot {
        total_xp: stats.total_xp,
        lessons_completed: stats.lessons_completed,
        courses_completed: stats.courses_completed,
        current_streak: stats.current_streak,
    };
    let awards = evaluate_badges(snapshot, &rules);

    for badge in unearned.iter().filter(|b| awards.badge_ids.contains(&b.id)) {
        if !badge_repo::award(&mut *conn, user_id, badge.id).await? {
            continue;
        }
        outcome.badges_awarded.push(badge.code.clone());
        grant(
            stats,
            outcome,
            XP_BADGE_AWARDED,
            i64::from(badge.xp_bonus),
            badge.id,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> CompletionOutcome {
        CompletionOutcome {
            lesson_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            newly_completed: true,
            course_completed: false,
            xp_awarded: 0,
            total_xp: 0,
            level: 1,
            leveled_up: false,
            current_streak: 0,
            badges_awarded: Vec::new(),
            challenges_completed: Vec::new(),
            grants: Vec::new(),
        }
    }

    #[test]
    fn test_grant_accumulates() {
        let mut stats = LearnerStats::empty(Uuid::new_v4());
        let mut outcome = outcome();
        let source = Uuid::new_v4();

        grant(&mut stats, &mut outcome, XP_LESSON_COMPLETED, 10, source);
        grant(&mut stats, &mut outcome, XP_COURSE_COMPLETED, 100, source);

        assert_eq!(stats.total_xp, 110);
        assert_eq!(outcome.xp_awarded, 110);
        assert_eq!(outcome.grants.len(), 2);
        assert_eq!(outcome.grants[1].reason, XP_COURSE_COMPLETED);
    }

    #[test]
    fn test_zero_grant_not_recorded() {
        let mut stats = LearnerStats::empty(Uuid::new_v4());
        let mut outcome = outcome();

        grant(&mut stats, &mut outcome, XP_BADGE_AWARDED, 0, Uuid::new_v4());

        assert_eq!(stats.total_xp, 0);
        assert!(outcome.grants.is_empty());
    }
}
