use axum::{extract::State, http::StatusCode, Json};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, AuthResponse, LoginRequest, RefreshRequest, Role, UserResponse, UserWithRoles,
};

use crate::auth::extractors::AuthRequired;
use crate::auth::jwt::{self, hash_token, validate_refresh_token};
use crate::auth::password as pw;
use crate::error_convert::SqlxErrorExt;
use crate::repo;

/// Create an access/refresh token pair and persist the refresh token's
/// hash — never the raw JWT.
async fn issue_tokens(
    pool: &Pool<Postgres>,
    user_id: i64,
    username: &str,
) -> Result<(String, String), AppError> {
    let access_token = jwt::create_access_token(user_id, username)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let (refresh_token, expires_at) = jwt::create_refresh_token(user_id, username)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let refresh_hash = hash_token(&refresh_token);
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&refresh_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((access_token, refresh_token))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // One round trip loads the credential hash and every role of the account.
    let rows = repo::user::auth_rows_by_email(&pool, &payload.email).await?;
    let Some(first) = rows.first() else {
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    let valid = pw::verify_password(&payload.password, &first.password_hash)
        .map_err(|e| AppError::internal(e.to_string()))?;
    if !valid {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let user_id = first.id;
    let username = first.username.clone();
    let roles: Vec<Role> = rows
        .into_iter()
        .map(|r| Role {
            id: r.role_id,
            authority: r.authority,
        })
        .collect();

    let user = repo::user::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    let (access_token, refresh_token) = issue_tokens(&pool, user_id, &username).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(UserWithRoles { user, roles }),
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/refresh — rotate the refresh token.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Invalid or revoked refresh token", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn refresh(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

    // Look up by hash, not raw token — the database stores SHA-256 hashes.
    let token_hash = hash_token(&payload.refresh_token);
    let stored = sqlx::query_as::<_, (i64, bool)>(
        "SELECT id, revoked FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2",
    )
    .bind(&token_hash)
    .bind(claims.sub)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let Some((token_id, revoked)) = stored else {
        return Err(AppError::unauthorized("Unknown refresh token"));
    };
    if revoked {
        return Err(AppError::unauthorized("Refresh token revoked"));
    }

    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
        .bind(token_id)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let user = repo::user::find_by_email(&pool, &claims.username)
        .await?
        .ok_or_else(|| AppError::unauthorized("Email not found"))?;
    let value = repo::user::with_roles(&pool, user).await?;

    let (access_token, refresh_token) = issue_tokens(&pool, value.id(), &claims.username).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(value),
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/logout — revoke all of the caller's refresh tokens.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn logout(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<StatusCode, AppError> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
        .bind(auth.0.sub)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}
