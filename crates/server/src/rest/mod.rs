pub mod auth;
pub mod courses;
pub mod deliveries;
pub mod enrollments;
pub mod replies;
pub mod users;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::db::AppState;

/// Build the REST API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/api/users", get(users::list_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/me", get(users::get_me))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/users/{id}", put(users::update_user))
        .route("/api/users/{id}", delete(users::delete_user))
        .route(
            "/api/users/{id}/enrollments",
            get(enrollments::list_user_enrollments),
        )
        // Course catalog
        .route("/api/courses", get(courses::list_courses))
        .route("/api/courses/{id}", get(courses::get_course))
        .route("/api/courses/{id}/offers", get(courses::list_course_offers))
        // Enrollments
        .route("/api/enrollments", post(enrollments::create_enrollment))
        .route(
            "/api/enrollments/{user_id}/{offer_id}",
            put(enrollments::update_enrollment),
        )
        .route(
            "/api/enrollments/{user_id}/{offer_id}/lessons/{lesson_id}",
            put(enrollments::mark_lesson_done),
        )
        .route(
            "/api/enrollments/{user_id}/{offer_id}/deliveries",
            get(deliveries::list_enrollment_deliveries),
        )
        // Deliveries
        .route("/api/deliveries", post(deliveries::submit_delivery))
        .route(
            "/api/deliveries/{id}/feedback",
            put(deliveries::revise_delivery),
        )
        // Discussion replies
        .route("/api/topics/{id}/replies", get(replies::list_topic_replies))
        .route("/api/topics/{id}/replies", post(replies::create_reply))
        .route("/api/replies/{id}/like", post(replies::like_reply))
        .route("/api/replies/{id}/like", delete(replies::unlike_reply))
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
}
