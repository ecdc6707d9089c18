use shared_types::{AppError, Offer};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<Offer>, AppError> {
    let row = sqlx::query_as::<_, Offer>(
        "SELECT id, edition, start_moment, end_moment, course_id FROM offers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

pub async fn list_by_course(
    pool: &Pool<Postgres>,
    course_id: i64,
) -> Result<Vec<Offer>, AppError> {
    let rows = sqlx::query_as::<_, Offer>(
        r#"
        SELECT id, edition, start_moment, end_moment, course_id
        FROM offers
        WHERE course_id = $1
        ORDER BY start_moment, id
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}
