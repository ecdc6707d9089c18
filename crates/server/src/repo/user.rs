use shared_types::{AppError, Role, User, UserWithRoles};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

// ---------------------------------------------------------------------------
// Lightweight query structs (not domain DTOs — repo-only)
// ---------------------------------------------------------------------------

/// One row of the denormalized user×role join used by the login bootstrap.
/// A user with N roles produces N rows sharing the same id/username/hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role_id: i64,
    pub authority: String,
}

/// A role row tagged with the user it belongs to, for batch loading.
#[derive(Debug, sqlx::FromRow)]
pub struct UserRoleRow {
    pub user_id: i64,
    pub role_id: i64,
    pub authority: String,
}

// ---------------------------------------------------------------------------
// Directory reads
// ---------------------------------------------------------------------------

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, name, email FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Exact email match, case-sensitive per stored normalization.
pub async fn find_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, name, email FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

pub async fn exists(pool: &Pool<Postgres>, id: i64) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(exists)
}

pub async fn roles_of(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<Role>, AppError> {
    let rows = sqlx::query_as::<_, Role>(
        r#"
        SELECT r.id, r.authority
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = $1
        ORDER BY r.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Materialize a user together with its role set.
pub async fn with_roles(pool: &Pool<Postgres>, user: User) -> Result<UserWithRoles, AppError> {
    let roles = roles_of(pool, user.id).await?;
    Ok(UserWithRoles { user, roles })
}

/// Batch-load the roles of many users in one round trip.
pub async fn roles_for_users(
    pool: &Pool<Postgres>,
    user_ids: &[i64],
) -> Result<Vec<UserRoleRow>, AppError> {
    let rows = sqlx::query_as::<_, UserRoleRow>(
        r#"
        SELECT ur.user_id, r.id AS role_id, r.authority
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = ANY($1)
        ORDER BY r.id
        "#,
    )
    .bind(user_ids.to_vec())
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// The denormalized join powering authentication: every (user, role) pair
/// for the given email. Zero rows means the account does not exist.
pub async fn auth_rows_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Vec<AuthRow>, AppError> {
    let rows = sqlx::query_as::<_, AuthRow>(
        r#"
        SELECT u.id, u.email AS username, u.password_hash, r.id AS role_id, r.authority
        FROM users u
        JOIN user_roles ur ON ur.user_id = u.id
        JOIN roles r ON r.id = ur.role_id
        WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Page of users, optionally filtered by a case-insensitive name substring.
/// Returns the page plus the total row count for pagination metadata.
pub async fn list(
    pool: &Pool<Postgres>,
    name_filter: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), AppError> {
    let offset = (page - 1) * limit;

    let (users, total) = match name_filter {
        Some(name) => {
            let pattern = format!("%{}%", name);
            let users = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email
                FROM users
                WHERE name ILIKE $1
                ORDER BY name, id
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

            let total =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE name ILIKE $1")
                    .bind(&pattern)
                    .fetch_one(pool)
                    .await
                    .map_err(SqlxErrorExt::into_app_error)?;

            (users, total)
        }
        None => {
            let users = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email
                FROM users
                ORDER BY name, id
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await
                .map_err(SqlxErrorExt::into_app_error)?;

            (users, total)
        }
    };

    Ok((users, total))
}

// ---------------------------------------------------------------------------
// Lifecycle writes — each is one transaction
// ---------------------------------------------------------------------------

/// Insert a new user and its role links atomically.
pub async fn create(
    pool: &Pool<Postgres>,
    name: &str,
    email: &str,
    password_hash: &str,
    role_ids: &[i64],
) -> Result<User, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, name, email
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    for role_id in role_ids {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    }

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(user)
}

/// Replace a user's fields and rebuild its role set from scratch, in one
/// transaction. Returns `None` when the id does not exist.
pub async fn update(
    pool: &Pool<Postgres>,
    id: i64,
    name: &str,
    email: &str,
    password_hash: &str,
    role_ids: &[i64],
) -> Result<Option<User>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = $2, email = $3, password_hash = $4
        WHERE id = $1
        RETURNING id, name, email
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let Some(user) = user else {
        tx.rollback().await.map_err(SqlxErrorExt::into_app_error)?;
        return Ok(None);
    };

    // Wholesale role-set replacement: clear then rebuild.
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    for role_id in role_ids {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    }

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(Some(user))
}

/// Delete a user unless it owns enrollments. The existence check, the
/// dependent check, and the delete run in the same transaction so the
/// guard cannot race the delete.
pub async fn delete_guarded(pool: &Pool<Postgres>, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    if !exists {
        return Err(AppError::not_found("User not found"));
    }

    let has_enrollments = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1)",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if has_enrollments {
        return Err(AppError::conflict(
            "User owns enrollments and cannot be deleted",
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}
