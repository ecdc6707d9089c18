use shared_types::{AppError, Reply, ReplyResponse};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn topic_exists(pool: &Pool<Postgres>, topic_id: i64) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM topics WHERE id = $1)")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(exists)
}

pub async fn create(
    pool: &Pool<Postgres>,
    topic_id: i64,
    author_id: i64,
    body: &str,
) -> Result<Reply, AppError> {
    let row = sqlx::query_as::<_, Reply>(
        r#"
        INSERT INTO replies (body, topic_id, author_id)
        VALUES ($1, $2, $3)
        RETURNING id, body, moment, topic_id, author_id
        "#,
    )
    .bind(body)
    .bind(topic_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Replies on a topic with author name and like count, oldest first.
pub async fn list_by_topic(
    pool: &Pool<Postgres>,
    topic_id: i64,
) -> Result<Vec<ReplyResponse>, AppError> {
    let rows = sqlx::query_as::<_, ReplyResponse>(
        r#"
        SELECT re.id, re.body, re.moment, re.topic_id, re.author_id,
               u.name AS author_name,
               (SELECT COUNT(*) FROM reply_likes rl WHERE rl.reply_id = re.id) AS likes
        FROM replies re
        JOIN users u ON u.id = re.author_id
        WHERE re.topic_id = $1
        ORDER BY re.moment, re.id
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

pub async fn exists(pool: &Pool<Postgres>, reply_id: i64) -> Result<bool, AppError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM replies WHERE id = $1)")
            .bind(reply_id)
            .fetch_one(pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

    Ok(exists)
}

/// Add the user to the reply's liked-by set. Idempotent.
pub async fn like(pool: &Pool<Postgres>, reply_id: i64, user_id: i64) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO reply_likes (reply_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(reply_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Remove the user from the reply's liked-by set.
pub async fn unlike(pool: &Pool<Postgres>, reply_id: i64, user_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM reply_likes WHERE reply_id = $1 AND user_id = $2")
        .bind(reply_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}
