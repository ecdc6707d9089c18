use shared_types::{
    AppError, CreateEnrollmentRequest, Enrollment, EnrollmentKey, EnrollmentSummary,
    UpdateEnrollmentRequest, UserWithRoles,
};
use sqlx::{Pool, Postgres};

use crate::repo;
use crate::service::access;

/// A user's enrollments, self-or-admin gated. An unknown user id is
/// NotFound before any authorization decision.
pub async fn list_for_user(
    pool: &Pool<Postgres>,
    caller: &UserWithRoles,
    user_id: i64,
) -> Result<Vec<EnrollmentSummary>, AppError> {
    if !repo::user::exists(pool, user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    access::require_self_or_admin(caller, user_id)?;

    repo::enrollment::summaries_by_user(pool, user_id).await
}

/// Enroll a user into an offer. At most one enrollment may ever exist per
/// (user, offer) pair; a pair flagged `only_update` can never be
/// re-created, only updated.
pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateEnrollmentRequest,
) -> Result<Enrollment, AppError> {
    if !repo::user::exists(pool, req.user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    if repo::offer::find_by_id(pool, req.offer_id).await?.is_none() {
        return Err(AppError::not_found("Offer not found"));
    }

    let key = EnrollmentKey::new(req.user_id, req.offer_id);
    if let Some(existing) = repo::enrollment::find_by_key(pool, key).await? {
        if existing.only_update {
            return Err(AppError::conflict(
                "Enrollment for this user and offer is update-only",
            ));
        }
        return Err(AppError::conflict("User is already enrolled in this offer"));
    }

    // A concurrent insert still trips the composite primary key, which the
    // error mapping surfaces as Conflict.
    repo::enrollment::create(pool, key, req.available.unwrap_or(true)).await
}

/// Mutate an enrollment's flags. The (user, offer) key is immutable.
pub async fn update(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
    req: &UpdateEnrollmentRequest,
) -> Result<Enrollment, AppError> {
    repo::enrollment::update(pool, key, req)
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment not found"))
}

/// Record a completed lesson for an enrollment, self-or-admin gated.
pub async fn mark_lesson_done(
    pool: &Pool<Postgres>,
    caller: &UserWithRoles,
    key: EnrollmentKey,
    lesson_id: i64,
) -> Result<(), AppError> {
    access::require_self_or_admin(caller, key.user_id)?;

    if repo::enrollment::find_by_key(pool, key).await?.is_none() {
        return Err(AppError::not_found("Enrollment not found"));
    }
    if !repo::enrollment::lesson_in_offer(pool, lesson_id, key.offer_id).await? {
        return Err(AppError::not_found("Lesson not found in this offer"));
    }

    repo::enrollment::mark_lesson_done(pool, key, lesson_id).await
}
