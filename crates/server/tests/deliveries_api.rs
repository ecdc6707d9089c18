//! Integration tests for delivery submission and instructor revision, plus
//! the discussion reply endpoints.
//!
//! These tests need a running PostgreSQL pointed to by DATABASE_URL; they
//! skip silently when it is not set.

mod common;

use axum::http::StatusCode;
use common::{
    get_with_auth, login, post_json_with_auth, put_json_with_auth, register_user, try_db,
    try_test_app, unique_suffix,
};
use shared_types::{Deliver, UserResponse};
use sqlx::{Pool, Postgres};

async fn seed_offer_with_lesson(pool: &Pool<Postgres>, edition: &str) -> (i64, i64) {
    let course_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO courses (name, img_uri, img_gray_uri)
        VALUES ($1, 'https://img.test/d.png', 'https://img.test/d-gray.png')
        RETURNING id
        "#,
    )
    .bind(format!("Async Rust {edition}"))
    .fetch_one(pool)
    .await
    .unwrap();

    let offer_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO offers (edition, start_moment, end_moment, course_id)
        VALUES ($1, now(), now() + interval '90 days', $2)
        RETURNING id
        "#,
    )
    .bind(edition)
    .bind(course_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let lesson_id: i64 = sqlx::query_scalar(
        "INSERT INTO lessons (title, position, offer_id) VALUES ('Futures', 1, $1) RETURNING id",
    )
    .bind(offer_id)
    .fetch_one(pool)
    .await
    .unwrap();

    (offer_id, lesson_id)
}

async fn user_with_role(app: &axum::Router, prefix: &str, role_id: i64) -> (UserResponse, String) {
    let (name, email) = unique_suffix(prefix);
    let (status, body) = register_user(app, &name, &email, "Secret123", &[role_id]).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let user: UserResponse = serde_json::from_str(&body).unwrap();
    let token = login(app, &email, "Secret123").await;
    (user, token)
}

async fn enroll(app: &axum::Router, admin: &str, user_id: i64, offer_id: i64) {
    let body = serde_json::json!({ "user_id": user_id, "offer_id": offer_id }).to_string();
    let (status, body) = post_json_with_auth(app, "/api/enrollments", &body, admin).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn submit_then_revise_delivery() {
    let Some(app) = try_test_app().await else {
        return;
    };
    let pool = try_db().await.unwrap();
    let (offer_id, lesson_id) = seed_offer_with_lesson(&pool, "rev-1").await;
    let (_, admin) = user_with_role(&app, "del_admin", 3).await;
    let (student, student_token) = user_with_role(&app, "del_student", 1).await;
    let (_, instructor_token) = user_with_role(&app, "del_instructor", 2).await;
    enroll(&app, &admin, student.id, offer_id).await;

    // student submits against their own enrollment
    let submit = serde_json::json!({
        "lesson_id": lesson_id,
        "offer_id": offer_id,
        "uri": "https://github.com/student/solution",
    });
    let (status, body) =
        post_json_with_auth(&app, "/api/deliveries", &submit.to_string(), &student_token).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let deliver: Deliver = serde_json::from_str(&body).unwrap();
    assert_eq!(deliver.status, "Pending");
    assert_eq!(deliver.user_id, student.id);

    // a student may not grade
    let feedback = serde_json::json!({
        "status": "Accepted",
        "feedback": "Nice work",
        "correct_count": 9,
    });
    let uri = format!("/api/deliveries/{}/feedback", deliver.id);
    let (status, _) =
        put_json_with_auth(&app, &uri, &feedback.to_string(), &student_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // an instructor may
    let (status, body) =
        put_json_with_auth(&app, &uri, &feedback.to_string(), &instructor_token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let revised: Deliver = serde_json::from_str(&body).unwrap();
    assert_eq!(revised.status, "Accepted");
    assert_eq!(revised.feedback.as_deref(), Some("Nice work"));
    assert_eq!(revised.correct_count, Some(9));

    // the enrollment's delivery list reflects the revision
    let list_uri = format!("/api/enrollments/{}/{}/deliveries", student.id, offer_id);
    let (status, body) = get_with_auth(&app, &list_uri, &student_token).await;
    assert_eq!(status, StatusCode::OK);
    let deliveries: Vec<Deliver> = serde_json::from_str(&body).unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].status, "Accepted");
}

#[tokio::test]
async fn submission_without_enrollment_is_404() {
    let Some(app) = try_test_app().await else {
        return;
    };
    let pool = try_db().await.unwrap();
    let (offer_id, lesson_id) = seed_offer_with_lesson(&pool, "noenroll-1").await;
    let (_, token) = user_with_role(&app, "del_unenrolled", 1).await;

    let submit = serde_json::json!({
        "lesson_id": lesson_id,
        "offer_id": offer_id,
        "uri": "https://github.com/student/solution",
    });
    let (status, _) =
        post_json_with_auth(&app, "/api/deliveries", &submit.to_string(), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revision_rejects_unknown_status() {
    let Some(app) = try_test_app().await else {
        return;
    };
    let pool = try_db().await.unwrap();
    let (offer_id, lesson_id) = seed_offer_with_lesson(&pool, "badstatus-1").await;
    let (_, admin) = user_with_role(&app, "del_bs_admin", 3).await;
    let (student, student_token) = user_with_role(&app, "del_bs_student", 1).await;
    enroll(&app, &admin, student.id, offer_id).await;

    let submit = serde_json::json!({
        "lesson_id": lesson_id,
        "offer_id": offer_id,
        "uri": "https://github.com/student/solution",
    });
    let (_, body) =
        post_json_with_auth(&app, "/api/deliveries", &submit.to_string(), &student_token).await;
    let deliver: Deliver = serde_json::from_str(&body).unwrap();

    let feedback = serde_json::json!({ "status": "Graded" });
    let uri = format!("/api/deliveries/{}/feedback", deliver.id);
    let (status, _) = put_json_with_auth(&app, &uri, &feedback.to_string(), &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replies_and_likes_flow() {
    let Some(app) = try_test_app().await else {
        return;
    };
    let pool = try_db().await.unwrap();
    let (author, author_token) = user_with_role(&app, "reply_author", 1).await;
    let (_, liker_token) = user_with_role(&app, "reply_liker", 1).await;

    let topic_id: i64 = sqlx::query_scalar(
        "INSERT INTO topics (title, body, author_id) VALUES ('Week 1 doubts', 'Where to start?', $1) RETURNING id",
    )
    .bind(author.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let reply = serde_json::json!({ "body": "Start with the ownership chapter." });
    let uri = format!("/api/topics/{topic_id}/replies");
    let (status, body) = post_json_with_auth(&app, &uri, &reply.to_string(), &author_token).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let reply: serde_json::Value = serde_json::from_str(&body).unwrap();
    let reply_id = reply["id"].as_i64().unwrap();

    // like twice from the same user: the liked-by set holds one entry
    let like_uri = format!("/api/replies/{reply_id}/like");
    let (status, _) = post_json_with_auth(&app, &like_uri, "", &liker_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = post_json_with_auth(&app, &like_uri, "", &liker_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = get_with_auth(&app, &uri, &author_token).await;
    assert_eq!(status, StatusCode::OK);
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["likes"], serde_json::json!(1));
    assert_eq!(rows[0]["author_name"].as_str().unwrap(), author.name);

    // posting on a missing topic is a 404
    let (status, _) = post_json_with_auth(
        &app,
        "/api/topics/99999999/replies",
        &serde_json::json!({ "body": "hello" }).to_string(),
        &author_token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
