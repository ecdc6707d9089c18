use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, CreateReplyRequest, Reply, ReplyResponse};

use crate::auth::extractors::AuthRequired;
use crate::error_convert::ValidateRequest;
use crate::repo;
use crate::service::users;

/// GET /api/topics/{id}/replies
#[utoipa::path(
    get,
    path = "/api/topics/{id}/replies",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Replies on the topic", body = [ReplyResponse]),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Topic not found", body = AppError)
    ),
    tag = "replies"
)]
pub async fn list_topic_replies(
    State(pool): State<Pool<Postgres>>,
    _auth: AuthRequired,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ReplyResponse>>, AppError> {
    if !repo::reply::topic_exists(&pool, id).await? {
        return Err(AppError::not_found("Topic not found"));
    }

    let replies = repo::reply::list_by_topic(&pool, id).await?;
    Ok(Json(replies))
}

/// POST /api/topics/{id}/replies — the caller is the author.
#[utoipa::path(
    post,
    path = "/api/topics/{id}/replies",
    params(("id" = i64, Path, description = "Topic id")),
    request_body = CreateReplyRequest,
    responses(
        (status = 201, description = "Reply posted", body = Reply),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Topic not found", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "replies"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn create_reply(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
    Json(body): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<Reply>), AppError> {
    body.validate_request()?;
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;

    if !repo::reply::topic_exists(&pool, id).await? {
        return Err(AppError::not_found("Topic not found"));
    }

    let reply = repo::reply::create(&pool, id, caller.id(), &body.body).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// POST /api/replies/{id}/like — idempotent.
#[utoipa::path(
    post,
    path = "/api/replies/{id}/like",
    params(("id" = i64, Path, description = "Reply id")),
    responses(
        (status = 204, description = "Reply liked"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Reply not found", body = AppError)
    ),
    tag = "replies"
)]
pub async fn like_reply(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;

    if !repo::reply::exists(&pool, id).await? {
        return Err(AppError::not_found("Reply not found"));
    }

    repo::reply::like(&pool, id, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/replies/{id}/like
#[utoipa::path(
    delete,
    path = "/api/replies/{id}/like",
    params(("id" = i64, Path, description = "Reply id")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Reply not found", body = AppError)
    ),
    tag = "replies"
)]
pub async fn unlike_reply(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;

    if !repo::reply::exists(&pool, id).await? {
        return Err(AppError::not_found("Reply not found"));
    }

    repo::reply::unlike(&pool, id, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
