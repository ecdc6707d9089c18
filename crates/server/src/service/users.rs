use std::collections::HashMap;

use shared_types::{
    AppError, PaginatedResponse, Role, RoleLookup, RoleResponse, UserListParams, UserResponse,
    UserUpsertRequest, UserWithRoles, normalize_pagination,
};
use sqlx::{Pool, Postgres};

use crate::auth::jwt::Claims;
use crate::auth::password;
use crate::error_convert::ValidateRequest;
use crate::repo;
use crate::service::access;

/// Resolve the authenticated caller: project the username claim, then load
/// the matching account and its roles. Both failure modes are
/// `Unauthorized` — an unresolvable identity is not a Forbidden.
pub async fn resolve_caller(
    pool: &Pool<Postgres>,
    claims: Option<&Claims>,
) -> Result<UserWithRoles, AppError> {
    let claims = claims.ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    let username = claims.username_claim()?;

    let user = repo::user::find_by_email(pool, username)
        .await?
        .ok_or_else(|| AppError::unauthorized("Email not found"))?;

    repo::user::with_roles(pool, user).await
}

/// Paged user listing. A blank filter means "all users"; otherwise the
/// match is a case-insensitive substring over the display name.
pub async fn list(
    pool: &Pool<Postgres>,
    params: &UserListParams,
) -> Result<PaginatedResponse<UserResponse>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);
    let filter = params
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (users, total) = repo::user::list(pool, filter, page, limit).await?;

    // Batch-load every page member's roles in one query.
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let mut roles_by_user: HashMap<i64, Vec<RoleResponse>> = HashMap::new();
    for row in repo::user::roles_for_users(pool, &ids).await? {
        roles_by_user
            .entry(row.user_id)
            .or_default()
            .push(RoleResponse {
                id: row.role_id,
                authority: row.authority,
            });
    }

    let data = users
        .into_iter()
        .map(|u| UserResponse {
            roles: roles_by_user.remove(&u.id).unwrap_or_default(),
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();

    Ok(PaginatedResponse::new(data, page, limit, total))
}

pub async fn get_by_id(pool: &Pool<Postgres>, id: i64) -> Result<UserResponse, AppError> {
    let user = repo::user::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let value = repo::user::with_roles(pool, user).await?;
    Ok(UserResponse::from(value))
}

/// Open registration: no authorization check.
pub async fn create(
    pool: &Pool<Postgres>,
    lookup: RoleLookup,
    req: &UserUpsertRequest,
) -> Result<UserResponse, AppError> {
    req.validate_request()?;

    let password_hash =
        password::hash_password(&req.password).map_err(|e| AppError::internal(e.to_string()))?;

    let roles = resolve_roles(pool, lookup, req).await?;
    let role_ids: Vec<i64> = roles.iter().map(|r| r.id).collect();

    let user = repo::user::create(pool, &req.name, &req.email, &password_hash, &role_ids).await?;

    Ok(UserResponse::from(UserWithRoles { user, roles }))
}

/// Replace a user's fields and role set. The decider must Allow for
/// `(caller, id)` before anything is touched.
pub async fn update(
    pool: &Pool<Postgres>,
    caller: &UserWithRoles,
    lookup: RoleLookup,
    id: i64,
    req: &UserUpsertRequest,
) -> Result<UserResponse, AppError> {
    access::require_self_or_admin(caller, id)?;
    req.validate_request()?;

    let password_hash =
        password::hash_password(&req.password).map_err(|e| AppError::internal(e.to_string()))?;

    let roles = resolve_roles(pool, lookup, req).await?;
    let role_ids: Vec<i64> = roles.iter().map(|r| r.id).collect();

    let user = repo::user::update(pool, id, &req.name, &req.email, &password_hash, &role_ids)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(UserResponse::from(UserWithRoles { user, roles }))
}

/// Delete a user. NotFound when the id is absent; Conflict when the user
/// still owns enrollments. The guard runs inside the delete transaction.
pub async fn delete(pool: &Pool<Postgres>, id: i64) -> Result<(), AppError> {
    repo::user::delete_guarded(pool, id).await
}

pub async fn get_me(
    pool: &Pool<Postgres>,
    claims: Option<&Claims>,
) -> Result<UserResponse, AppError> {
    let caller = resolve_caller(pool, claims).await?;
    Ok(UserResponse::from(caller))
}

/// Resolve every role reference eagerly, deduplicating by id so the
/// rebuilt role set never inserts the same link twice.
async fn resolve_roles(
    pool: &Pool<Postgres>,
    lookup: RoleLookup,
    req: &UserUpsertRequest,
) -> Result<Vec<Role>, AppError> {
    let mut roles: Vec<Role> = Vec::with_capacity(req.roles.len());
    for role_ref in &req.roles {
        let role = repo::role::resolve(pool, lookup, role_ref).await?;
        if !roles.iter().any(|r| r.id == role.id) {
            roles.push(role);
        }
    }
    Ok(roles)
}
