use crate::common::{TestClient, TestStateBuilder, id_of, token_for, unique};
use axum::http::StatusCode;
use lms_api::auth::Role;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_course_defaults() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let title = unique("Intro to Rust");
    let course = client.create_course(&token, &title).await;

    assert_eq!(course["title"], title);
    assert_eq!(course["status"], "draft");
    assert_eq!(course["level"], "beginner");
    assert_eq!(course["xp_reward"], 100);
    assert!(course["series_id"].is_null());
    assert!(course["slug"].as_str().unwrap().starts_with("intro-to-rust-"));
}

#[tokio::test]
async fn test_same_title_gets_distinct_slug() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let title = unique("Twin");
    let first = client.create_course(&token, &title).await;
    let second = client.create_course(&token, &title).await;

    assert_ne!(first["slug"], second["slug"]);
    assert!(
        second["slug"]
            .as_str()
            .unwrap()
            .starts_with(first["slug"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_course_detail_outline() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let seeded = client.seed_course(&token, 2).await;
    let second = client
        .create_module(&token, &seeded.course_id, "Second")
        .await;
    client
        .create_lesson(
            &token,
            &id_of(&second),
            json!({ "title": "Quiz", "kind": "quiz", "duration_minutes": 15 }),
        )
        .await;

    let response = client.get(&format!("/courses/{}", seeded.course_id)).await;
    response.assert_status(StatusCode::OK);

    let detail = response.data();
    assert_eq!(detail["id"], seeded.course_id.as_str());

    let modules = detail["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0]["id"], seeded.module_id.as_str());
    assert_eq!(modules[0]["lessons"].as_array().unwrap().len(), 2);
    assert_eq!(modules[1]["order"], 2);

    let quiz = &modules[1]["lessons"][0];
    assert_eq!(quiz["kind"], "quiz");
    assert_eq!(quiz["duration_minutes"], 15);
    assert_eq!(quiz["xp_reward"], 10);
}

#[tokio::test]
async fn test_get_missing_course() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let client = TestClient::new(state);

    let response = client.get(&format!("/courses/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.error(), "Course not found");
}

#[tokio::test]
async fn test_update_course() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let course = client.create_course(&token, &unique("Draft")).await;
    let course_id = id_of(&course);

    let response = client
        .patch_json_auth(
            &format!("/courses/{course_id}"),
            &token,
            json!({ "level": "advanced", "xp_reward": 250 }),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let updated = response.data();
    assert_eq!(updated["level"], "advanced");
    assert_eq!(updated["xp_reward"], 250);
    assert_eq!(updated["title"], course["title"]);

    let response = client
        .patch_json_auth(&format!("/courses/{course_id}"), &token, json!({ "title": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_lifecycle() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    // Nothing to learn yet
    let empty = client.create_course(&token, &unique("Empty")).await;
    let response = client
        .post_auth(&format!("/courses/{}/publish", id_of(&empty)), &token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let seeded = client.seed_course(&token, 1).await;
    let publish_uri = format!("/courses/{}/publish", seeded.course_id);

    let response = client.post_auth(&publish_uri, &token).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["status"], "published");
    assert!(response.data()["published_at"].is_string());

    client
        .post_auth(&publish_uri, &token)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = client
        .post_auth(&format!("/courses/{}/archive", seeded.course_id), &token)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["status"], "archived");

    client
        .post_auth(&publish_uri, &token)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_courses_filters() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let marker = Uuid::new_v4().simple().to_string();
    let published = client.seed_course(&token, 1).await;
    client
        .patch_json_auth(
            &format!("/courses/{}", published.course_id),
            &token,
            json!({ "title": format!("Listed {marker} A") }),
        )
        .await
        .assert_status(StatusCode::OK);
    client.publish(&token, &published.course_id).await;
    client
        .create_course(&token, &format!("Listed {marker} B"))
        .await;

    let response = client.get(&format!("/courses?search={marker}")).await;
    response.assert_status(StatusCode::OK);
    let page = response.data();
    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);

    let response = client
        .get(&format!("/courses?search={marker}&status=published"))
        .await;
    let page = response.data();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], published.course_id.as_str());

    let response = client
        .get(&format!("/courses?search={marker}&per_page=1&page=2"))
        .await;
    let page = response.data();
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["total"], 2);

    client
        .get("/courses?per_page=0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_course_with_active_enrollment() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, instructor) = token_for(&state, Role::Instructor);
    let (_, learner) = token_for(&state, Role::Learner);
    let client = TestClient::new(state);

    let seeded = client.seed_course(&instructor, 1).await;
    client.publish(&instructor, &seeded.course_id).await;
    client
        .post_auth(&format!("/courses/{}/enroll", seeded.course_id), &learner)
        .await
        .assert_status(StatusCode::CREATED);

    let course_uri = format!("/courses/{}", seeded.course_id);
    client
        .delete_auth(&course_uri, &instructor)
        .await
        .assert_status(StatusCode::CONFLICT);

    client
        .post_auth(&format!("/courses/{}/drop", seeded.course_id), &learner)
        .await
        .assert_status(StatusCode::OK);

    client
        .delete_auth(&course_uri, &instructor)
        .await
        .assert_status(StatusCode::OK);
    client
        .get(&course_uri)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_series_detaches_courses() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let response = client
        .post_json_auth("/series", &token, json!({ "title": unique("Track") }))
        .await;
    let series_id = id_of(&response.data());

    let course = client.create_course(&token, &unique("Member")).await;
    let course_id = id_of(&course);
    client
        .post_json_auth(
            &format!("/series/{series_id}/courses"),
            &token,
            json!({ "course_id": course_id }),
        )
        .await
        .assert_status(StatusCode::CREATED);

    client
        .delete_auth(&format!("/series/{series_id}"), &token)
        .await
        .assert_status(StatusCode::OK);

    let course = client.get(&format!("/courses/{course_id}")).await.data();
    assert!(course["series_id"].is_null());
    assert!(course["series_position"].is_null());
}

#[tokio::test]
async fn test_delete_series_member_compacts_series() {
    let Some(state) = TestStateBuilder::new().build().await else {
        return;
    };
    let (_, token) = token_for(&state, Role::Instructor);
    let client = TestClient::new(state);

    let response = client
        .post_json_auth("/series", &token, json!({ "title": unique("Path") }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let series_id = id_of(&response.data());

    let mut course_ids = Vec::new();
    for n in 0..3 {
        let course = client.create_course(&token, &unique(&format!("Step {n}"))).await;
        let course_id = id_of(&course);
        client
            .post_json_auth(
                &format!("/series/{series_id}/courses"),
                &token,
                json!({ "course_id": course_id }),
            )
            .await
            .assert_status(StatusCode::CREATED);
        course_ids.push(course_id);
    }

    client
        .delete_auth(&format!("/courses/{}", course_ids[0]), &token)
        .await
        .assert_status(StatusCode::OK);

    let detail = client.get(&format!("/series/{series_id}")).await.data();
    let positions: Vec<(String, i64)> = detail["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (id_of(c), c["series_position"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        positions,
        vec![(course_ids[1].clone(), 1), (course_ids[2].clone(), 2)]
    );
}
