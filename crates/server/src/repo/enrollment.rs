use shared_types::{
    AppError, Enrollment, EnrollmentKey, EnrollmentSummary, UpdateEnrollmentRequest,
};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn find_by_key(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
) -> Result<Option<Enrollment>, AppError> {
    let row = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT user_id, offer_id, enroll_moment, refund_moment, available, only_update
        FROM enrollments
        WHERE user_id = $1 AND offer_id = $2
        "#,
    )
    .bind(key.user_id)
    .bind(key.offer_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// A user's enrollments projected through the offer and its course.
pub async fn summaries_by_user(
    pool: &Pool<Postgres>,
    user_id: i64,
) -> Result<Vec<EnrollmentSummary>, AppError> {
    let rows = sqlx::query_as::<_, EnrollmentSummary>(
        r#"
        SELECT o.id AS offer_id, c.name AS course_name, o.edition,
               o.start_moment, o.end_moment, c.img_uri, c.img_gray_uri
        FROM enrollments e
        JOIN offers o ON o.id = e.offer_id
        JOIN courses c ON c.id = o.course_id
        WHERE e.user_id = $1
        ORDER BY o.start_moment, o.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Insert a fresh enrollment. The composite primary key makes a duplicate
/// pair fail with a unique violation, surfaced as Conflict.
pub async fn create(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
    available: bool,
) -> Result<Enrollment, AppError> {
    let row = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments (user_id, offer_id, available)
        VALUES ($1, $2, $3)
        RETURNING user_id, offer_id, enroll_moment, refund_moment, available, only_update
        "#,
    )
    .bind(key.user_id)
    .bind(key.offer_id)
    .bind(available)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Update an enrollment's flags. The key columns are never touched.
pub async fn update(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
    req: &UpdateEnrollmentRequest,
) -> Result<Option<Enrollment>, AppError> {
    let row = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments
        SET refund_moment = COALESCE($3, refund_moment),
            available = COALESCE($4, available),
            only_update = COALESCE($5, only_update)
        WHERE user_id = $1 AND offer_id = $2
        RETURNING user_id, offer_id, enroll_moment, refund_moment, available, only_update
        "#,
    )
    .bind(key.user_id)
    .bind(key.offer_id)
    .bind(req.refund_moment)
    .bind(req.available)
    .bind(req.only_update)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Record a completed lesson for an enrollment. Idempotent.
pub async fn mark_lesson_done(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
    lesson_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO lessons_done (user_id, offer_id, lesson_id)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(key.user_id)
    .bind(key.offer_id)
    .bind(lesson_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Whether the lesson belongs to the given offer.
pub async fn lesson_in_offer(
    pool: &Pool<Postgres>,
    lesson_id: i64,
    offer_id: i64,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM lessons WHERE id = $1 AND offer_id = $2)",
    )
    .bind(lesson_id)
    .bind(offer_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(exists)
}
