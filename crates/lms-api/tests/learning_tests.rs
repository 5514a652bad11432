use crate::common::{SeededCourse, TestClient, TestStateBuilder, token_for};
use axum::http::StatusCode;
use lms_api::auth::Role;
use serde_json::{Value, json};

/// XP granted for `reason` in a completion outcome
fn granted(outcome: &Value, reason: &str) -> i64 {
    outcome["grants"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|g| g["reason"] == reason)
        .map(|g| g["amount"].as_i64().unwrap())
        .sum()
}

async fn published_course(client: &TestClient, token: &str, lessons: usize) -> SeededCourse {
    let seeded = client.seed_course(token, lessons).await;
    client.publish(token, &seeded.course_id).await;
    seeded
}

async fn complete(client: &TestClient, token: &str, lesson_id: &str) -> Value {
    let response = client
        .post_auth(&format!("/lessons/{lesson_id}/complete"), token)
        .await;
    response.assert_status(StatusCode::OK);
    response.data()
}

#[tokio::test]
async fn test_enroll_requires_published_course() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (_, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let draft = client.seed_course(&instructor, 1).await;

    let response = client
        .post_auth(&format!("/courses/{}/enroll", draft.course_id), &learner)
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_enroll_drop_and_reenroll() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (user_id, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let course = published_course(&client, &instructor, 1).await;
    let enroll_uri = format!("/courses/{}/enroll", course.course_id);
    let drop_uri = format!("/courses/{}/drop", course.course_id);

    let response = client.post_auth(&enroll_uri, &learner).await;
    response.assert_status(StatusCode::CREATED);
    let enrollment = response.data();
    assert_eq!(enrollment["status"], "active");
    assert_eq!(enrollment["user_id"], user_id.to_string().as_str());

    client
        .post_auth(&enroll_uri, &learner)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = client.post_auth(&drop_uri, &learner).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["status"], "dropped");

    client
        .post_auth(&drop_uri, &learner)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Coming back reactivates the same enrollment
    let response = client.post_auth(&enroll_uri, &learner).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["status"], "active");
}

#[tokio::test]
async fn test_complete_requires_enrollment() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (_, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let course = published_course(&client, &instructor, 1).await;

    let response = client
        .post_auth(&format!("/lessons/{}/complete", course.lesson_ids[0]), &learner)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_completing_all_lessons_completes_course() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (_, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let course = published_course(&client, &instructor, 2).await;
    client
        .post_auth(&format!("/courses/{}/enroll", course.course_id), &learner)
        .await
        .assert_status(StatusCode::CREATED);

    let first = complete(&client, &learner, &course.lesson_ids[0]).await;
    assert_eq!(first["newly_completed"], true);
    assert_eq!(first["course_completed"], false);
    assert_eq!(granted(&first, "lesson_completed"), 10);
    assert_eq!(first["current_streak"], 1);
    assert_eq!(first["total_xp"], first["xp_awarded"]);

    // Completing the same lesson again earns nothing
    let again = complete(&client, &learner, &course.lesson_ids[0]).await;
    assert_eq!(again["newly_completed"], false);
    assert_eq!(again["xp_awarded"], 0);
    assert_eq!(again["total_xp"], first["total_xp"]);

    let last = complete(&client, &learner, &course.lesson_ids[1]).await;
    assert_eq!(last["course_completed"], true);
    assert_eq!(granted(&last, "lesson_completed"), 10);
    assert_eq!(granted(&last, "course_completed"), 100);
    assert_eq!(last["current_streak"], 1);
    assert_eq!(
        last["total_xp"].as_i64().unwrap(),
        first["total_xp"].as_i64().unwrap() + last["xp_awarded"].as_i64().unwrap()
    );

    // A completed course cannot be enrolled in again
    client
        .post_auth(&format!("/courses/{}/enroll", course.course_id), &learner)
        .await
        .assert_status(StatusCode::CONFLICT);

    let progress = client.get_auth("/me/progress", &learner).await.data();
    assert_eq!(progress["stats"]["lessons_completed"], 2);
    assert_eq!(progress["stats"]["courses_completed"], 1);
    assert_eq!(progress["stats"]["total_xp"], last["total_xp"]);

    let enrollment = &progress["enrollments"][0];
    assert_eq!(enrollment["course_id"], course.course_id.as_str());
    assert_eq!(enrollment["status"], "completed");
    assert_eq!(enrollment["completed_lessons"], 2);
    assert_eq!(enrollment["total_lessons"], 2);
}

#[tokio::test]
async fn test_prerequisites_gate_enrollment() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (_, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let basics = published_course(&client, &instructor, 1).await;
    let advanced = published_course(&client, &instructor, 1).await;
    client
        .post_json_auth(
            &format!("/courses/{}/prerequisites", advanced.course_id),
            &instructor,
            json!({ "prerequisite_course_id": basics.course_id }),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let advanced_uri = format!("/courses/{}/enroll", advanced.course_id);
    let response = client.post_auth(&advanced_uri, &learner).await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(response.error().contains("prerequisite"));

    client
        .post_auth(&format!("/courses/{}/enroll", basics.course_id), &learner)
        .await
        .assert_status(StatusCode::CREATED);
    let outcome = complete(&client, &learner, &basics.lesson_ids[0]).await;
    assert_eq!(outcome["course_completed"], true);

    client
        .post_auth(&advanced_uri, &learner)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_progress_for_new_learner() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (user_id, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let response = client.get_auth("/me/progress", &learner).await;
    response.assert_status(StatusCode::OK);

    let progress = response.data();
    assert_eq!(progress["stats"]["user_id"], user_id.to_string().as_str());
    assert_eq!(progress["stats"]["total_xp"], 0);
    assert_eq!(progress["stats"]["level"], 1);
    assert_eq!(progress["stats"]["current_streak"], 0);
    assert!(progress["badges"].as_array().unwrap().is_empty());
    assert!(progress["enrollments"].as_array().unwrap().is_empty());
}
