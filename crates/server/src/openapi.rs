use axum::{middleware, Router};
use sqlx::{Pool, Postgres};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use shared_types::{
    AppError, AppErrorKind, AuthResponse, Course, CreateEnrollmentRequest, CreateReplyRequest,
    Deliver, DeliverFeedbackRequest, DeliverStatus, Enrollment, EnrollmentKey, EnrollmentSummary,
    Lesson, LoginRequest, Offer, PaginatedResponse, PaginationMeta, RefreshRequest, Reply,
    ReplyResponse, RoleRef, RoleResponse, SubmitDeliverRequest, Topic, UpdateEnrollmentRequest,
    UserResponse, UserUpsertRequest,
};

use crate::auth;
use crate::db::AppState;
use crate::health;
use crate::rest;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::users::list_users,
        rest::users::get_user,
        rest::users::get_me,
        rest::users::create_user,
        rest::users::update_user,
        rest::users::delete_user,
        rest::enrollments::list_user_enrollments,
        rest::enrollments::create_enrollment,
        rest::enrollments::update_enrollment,
        rest::enrollments::mark_lesson_done,
        rest::courses::list_courses,
        rest::courses::get_course,
        rest::courses::list_course_offers,
        rest::deliveries::submit_delivery,
        rest::deliveries::revise_delivery,
        rest::deliveries::list_enrollment_deliveries,
        rest::replies::list_topic_replies,
        rest::replies::create_reply,
        rest::replies::like_reply,
        rest::replies::unlike_reply,
        rest::auth::login,
        rest::auth::refresh,
        rest::auth::logout,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        UserResponse, RoleResponse, UserUpsertRequest, RoleRef,
        PaginatedResponse<UserResponse>, PaginationMeta,
        LoginRequest, RefreshRequest, AuthResponse,
        Course, Offer, Lesson,
        Enrollment, EnrollmentKey, EnrollmentSummary,
        CreateEnrollmentRequest, UpdateEnrollmentRequest,
        Deliver, DeliverStatus, SubmitDeliverRequest, DeliverFeedbackRequest,
        Topic, Reply, ReplyResponse, CreateReplyRequest,
    )),
    tags(
        (name = "users", description = "User lifecycle endpoints"),
        (name = "enrollments", description = "Enrollment management endpoints"),
        (name = "courses", description = "Course catalog reference data"),
        (name = "deliveries", description = "Lesson delivery submission and revision"),
        (name = "replies", description = "Discussion reply endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Studyline API",
        description = "E-learning platform backend",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

/// Build the application router: REST API + `/health`, bearer middleware,
/// request tracing, and (when enabled) the API reference at `/docs`.
pub fn api_router(pool: Pool<Postgres>) -> Router {
    let state = AppState { pool };
    let flags = &crate::config::app_config().features;

    let router = rest::api_router()
        .route("/health", axum::routing::get(health::health_check))
        .layer(middleware::from_fn(auth::middleware::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if flags.docs {
        router.merge(Scalar::with_url("/docs", ApiDoc::openapi()))
    } else {
        router
    }
}
