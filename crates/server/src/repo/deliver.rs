use shared_types::{AppError, Deliver, DeliverStatus, EnrollmentKey};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const DELIVER_COLUMNS: &str =
    "id, uri, moment, status, feedback, correct_count, lesson_id, user_id, offer_id";

/// Insert a new submission. Status starts out `Pending`.
pub async fn create(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
    lesson_id: i64,
    uri: &str,
) -> Result<Deliver, AppError> {
    let row = sqlx::query_as::<_, Deliver>(&format!(
        r#"
        INSERT INTO deliveries (uri, lesson_id, user_id, offer_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {DELIVER_COLUMNS}
        "#,
    ))
    .bind(uri)
    .bind(lesson_id)
    .bind(key.user_id)
    .bind(key.offer_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<Deliver>, AppError> {
    let row = sqlx::query_as::<_, Deliver>(&format!(
        "SELECT {DELIVER_COLUMNS} FROM deliveries WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

pub async fn list_by_enrollment(
    pool: &Pool<Postgres>,
    key: EnrollmentKey,
) -> Result<Vec<Deliver>, AppError> {
    let rows = sqlx::query_as::<_, Deliver>(&format!(
        r#"
        SELECT {DELIVER_COLUMNS}
        FROM deliveries
        WHERE user_id = $1 AND offer_id = $2
        ORDER BY moment, id
        "#,
    ))
    .bind(key.user_id)
    .bind(key.offer_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Apply an instructor revision. Returns `None` when the id does not exist.
pub async fn apply_feedback(
    pool: &Pool<Postgres>,
    id: i64,
    status: DeliverStatus,
    feedback: Option<&str>,
    correct_count: Option<i32>,
) -> Result<Option<Deliver>, AppError> {
    let row = sqlx::query_as::<_, Deliver>(&format!(
        r#"
        UPDATE deliveries
        SET status = $2, feedback = $3, correct_count = $4
        WHERE id = $1
        RETURNING {DELIVER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(feedback)
    .bind(correct_count)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}
