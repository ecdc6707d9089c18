use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, PaginatedResponse, UserListParams, UserResponse, UserUpsertRequest, ROLE_ADMIN,
};

use crate::auth::extractors::{AuthRequired, MaybeAuth};
use crate::config;
use crate::service::{access, users};

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListParams),
    responses(
        (status = 200, description = "Paginated user list", body = PaginatedResponse<UserResponse>)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    let page = users::list(&pool, &params).await?;
    Ok(Json(page))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::get_by_id(&pool, id).await?;
    Ok(Json(user))
}

/// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller's own user", body = UserResponse),
        (status = 401, description = "Identity not resolvable", body = AppError)
    ),
    tag = "users"
)]
pub async fn get_me(
    State(pool): State<Pool<Postgres>>,
    MaybeAuth(claims): MaybeAuth,
) -> Result<Json<UserResponse>, AppError> {
    let me = users::get_me(&pool, claims.as_ref()).await?;
    Ok(Json(me))
}

/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserUpsertRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 404, description = "Referenced role not found", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn create_user(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<UserUpsertRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<UserResponse>), AppError> {
    let lookup = config::app_config().roles.lookup;
    let user = users::create(&pool, lookup, &body).await?;
    let location = format!("/api/users/{}", user.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(user),
    ))
}

/// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpsertRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not self and not admin", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool, auth, body))]
pub async fn update_user(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
    Json(body): Json<UserUpsertRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    let lookup = config::app_config().roles.lookup;
    let user = users::update(&pool, &caller, lookup, id, &body).await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id} — admin only.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "User owns enrollments", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn delete_user(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let caller = users::resolve_caller(&pool, Some(&auth.0)).await?;
    access::require_any_authority(&caller, &[ROLE_ADMIN])?;

    users::delete(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
