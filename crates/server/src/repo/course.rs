use shared_types::{AppError, Course};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, Course>(
        "SELECT id, name, img_uri, img_gray_uri FROM courses ORDER BY name, id",
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, Course>(
        "SELECT id, name, img_uri, img_gray_uri FROM courses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}
