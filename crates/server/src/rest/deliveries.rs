use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, Deliver, DeliverFeedbackRequest, DeliverStatus, EnrollmentKey, SubmitDeliverRequest,
    ROLE_ADMIN, ROLE_INSTRUCTOR,
};

use crate::auth::extractors::AuthRequired;
use crate::error_convert::ValidateRequest;
use crate::repo;
use crate::service::{access, users};

/// POST /api/deliveries — submit work against a lesson of the caller's own
/// enrollment.
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = SubmitDeliverRequest,
    responses(
        (status = 201, description = "Delivery submitted", body = Deliver),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Enrollment or lesson not found", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "deliveries"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn submit_delivery(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Json(body): Json<SubmitDeliverRequest>,
) -> Result<(StatusCode, Json<Deliver>), AppError> {
    body.validate_request()?;
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;

    let key = EnrollmentKey::new(caller.id(), body.offer_id);
    if repo::enrollment::find_by_key(&pool, key).await?.is_none() {
        return Err(AppError::not_found("Enrollment not found"));
    }
    if !repo::enrollment::lesson_in_offer(&pool, body.lesson_id, body.offer_id).await? {
        return Err(AppError::not_found("Lesson not found in this offer"));
    }

    let deliver = repo::deliver::create(&pool, key, body.lesson_id, &body.uri).await?;
    Ok((StatusCode::CREATED, Json(deliver)))
}

/// PUT /api/deliveries/{id}/feedback — instructor or admin revision.
#[utoipa::path(
    put,
    path = "/api/deliveries/{id}/feedback",
    params(("id" = i64, Path, description = "Delivery id")),
    request_body = DeliverFeedbackRequest,
    responses(
        (status = 200, description = "Delivery revised", body = Deliver),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 403, description = "Instructor or admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "deliveries"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn revise_delivery(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
    Json(body): Json<DeliverFeedbackRequest>,
) -> Result<Json<Deliver>, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    access::require_any_authority(&caller, &[ROLE_INSTRUCTOR, ROLE_ADMIN])?;

    let status = DeliverStatus::from_str_opt(&body.status).ok_or_else(|| {
        AppError::bad_request(format!(
            "Invalid status '{}'. Valid: Pending, Accepted, Rejected",
            body.status
        ))
    })?;

    let deliver = repo::deliver::apply_feedback(
        &pool,
        id,
        status,
        body.feedback.as_deref(),
        body.correct_count,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Delivery not found"))?;

    Ok(Json(deliver))
}

/// GET /api/enrollments/{user_id}/{offer_id}/deliveries — self-or-admin.
#[utoipa::path(
    get,
    path = "/api/enrollments/{user_id}/{offer_id}/deliveries",
    params(
        ("user_id" = i64, Path, description = "Enrolled user id"),
        ("offer_id" = i64, Path, description = "Offer id")
    ),
    responses(
        (status = 200, description = "The enrollment's deliveries", body = [Deliver]),
        (status = 403, description = "Not self and not admin", body = AppError),
        (status = 404, description = "Enrollment not found", body = AppError)
    ),
    tag = "deliveries"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn list_enrollment_deliveries(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path((user_id, offer_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Deliver>>, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    access::require_self_or_admin(&caller, user_id)?;

    let key = EnrollmentKey::new(user_id, offer_id);
    if repo::enrollment::find_by_key(&pool, key).await?.is_none() {
        return Err(AppError::not_found("Enrollment not found"));
    }

    let deliveries = repo::deliver::list_by_enrollment(&pool, key).await?;
    Ok(Json(deliveries))
}
