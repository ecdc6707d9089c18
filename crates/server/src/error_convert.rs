use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // PostgreSQL unique constraint violation
            Some("23505") => {
                let detail = db_err.message();
                let friendly = if detail.contains("email") {
                    "An account with this email already exists"
                } else if detail.contains("enrollments") {
                    "User is already enrolled in this offer"
                } else {
                    "A record with this value already exists"
                };
                AppError::conflict(friendly)
            }
            // Foreign key violation: a dependent row blocks the operation.
            // The services check proactively; this is the race fallback.
            Some("23503") => AppError::conflict("Operation blocked by dependent records"),
            _ => AppError::database(err.to_string()),
        },
        _ => AppError::database(err.to_string()),
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}
