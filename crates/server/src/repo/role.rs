use shared_types::{AppError, Role, RoleLookup, RoleRef};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<Role>, AppError> {
    let row = sqlx::query_as::<_, Role>("SELECT id, authority FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

pub async fn find_by_authority(
    pool: &Pool<Postgres>,
    authority: &str,
) -> Result<Option<Role>, AppError> {
    let row = sqlx::query_as::<_, Role>("SELECT id, authority FROM roles WHERE authority = $1")
        .bind(authority)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Resolve a role reference eagerly. Callers get an explicit NotFound for an
/// unknown role instead of a deferred failure at first use.
pub async fn resolve(
    pool: &Pool<Postgres>,
    lookup: RoleLookup,
    role_ref: &RoleRef,
) -> Result<Role, AppError> {
    match lookup {
        RoleLookup::Id => {
            let id = role_ref
                .id
                .ok_or_else(|| AppError::bad_request("Role reference requires an id"))?;
            find_by_id(pool, id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))
        }
        RoleLookup::Authority => {
            let authority = role_ref
                .authority
                .as_deref()
                .ok_or_else(|| AppError::bad_request("Role reference requires an authority"))?;
            find_by_authority(pool, authority)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Role {} not found", authority)))
        }
    }
}
