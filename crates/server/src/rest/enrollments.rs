use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, CreateEnrollmentRequest, Enrollment, EnrollmentKey, EnrollmentSummary,
    UpdateEnrollmentRequest, ROLE_ADMIN,
};

use crate::auth::extractors::AuthRequired;
use crate::service::{access, enrollments, users};

/// GET /api/users/{id}/enrollments — self-or-admin.
#[utoipa::path(
    get,
    path = "/api/users/{id}/enrollments",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's enrollments", body = [EnrollmentSummary]),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not self and not admin", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "enrollments"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn list_user_enrollments(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EnrollmentSummary>>, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    let summaries = enrollments::list_for_user(&pool, &caller, id).await?;
    Ok(Json(summaries))
}

/// POST /api/enrollments — admin only.
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrollment created", body = Enrollment),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User or offer not found", body = AppError),
        (status = 409, description = "Pair already enrolled or update-only", body = AppError)
    ),
    tag = "enrollments"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn create_enrollment(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Json(body): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    access::require_any_authority(&caller, &[ROLE_ADMIN])?;

    let enrollment = enrollments::create(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// PUT /api/enrollments/{user_id}/{offer_id} — admin only.
#[utoipa::path(
    put,
    path = "/api/enrollments/{user_id}/{offer_id}",
    params(
        ("user_id" = i64, Path, description = "Enrolled user id"),
        ("offer_id" = i64, Path, description = "Offer id")
    ),
    request_body = UpdateEnrollmentRequest,
    responses(
        (status = 200, description = "Enrollment updated", body = Enrollment),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Enrollment not found", body = AppError)
    ),
    tag = "enrollments"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn update_enrollment(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path((user_id, offer_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateEnrollmentRequest>,
) -> Result<Json<Enrollment>, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    access::require_any_authority(&caller, &[ROLE_ADMIN])?;

    let key = EnrollmentKey::new(user_id, offer_id);
    let enrollment = enrollments::update(&pool, key, &body).await?;
    Ok(Json(enrollment))
}

/// PUT /api/enrollments/{user_id}/{offer_id}/lessons/{lesson_id} —
/// mark a lesson as completed for the enrollment. Self-or-admin.
#[utoipa::path(
    put,
    path = "/api/enrollments/{user_id}/{offer_id}/lessons/{lesson_id}",
    params(
        ("user_id" = i64, Path, description = "Enrolled user id"),
        ("offer_id" = i64, Path, description = "Offer id"),
        ("lesson_id" = i64, Path, description = "Lesson id")
    ),
    responses(
        (status = 204, description = "Lesson recorded as done"),
        (status = 403, description = "Not self and not admin", body = AppError),
        (status = 404, description = "Enrollment or lesson not found", body = AppError)
    ),
    tag = "enrollments"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn mark_lesson_done(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path((user_id, offer_id, lesson_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;

    let key = EnrollmentKey::new(user_id, offer_id);
    enrollments::mark_lesson_done(&pool, &caller, key, lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
