use shared_types::{AppError, UserWithRoles, ROLE_ADMIN};

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Self-or-admin rule: the caller may act on the target user when it holds
/// the `ROLE_ADMIN` authority or when the target is the caller itself.
/// Pure decision — callers translate Deny at the boundary.
pub fn authorize(caller: &UserWithRoles, target_user_id: i64) -> Decision {
    if caller.has_authority(ROLE_ADMIN) {
        return Decision::Allow;
    }
    if caller.id() == target_user_id {
        return Decision::Allow;
    }
    Decision::Deny
}

/// Translate a Deny into the boundary's Forbidden error.
pub fn require_self_or_admin(caller: &UserWithRoles, target_user_id: i64) -> Result<(), AppError> {
    match authorize(caller, target_user_id) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AppError::forbidden(
            "You do not have permission to access this resource",
        )),
    }
}

/// Require at least one of the given authorities, exactly matched.
pub fn require_any_authority(
    caller: &UserWithRoles,
    authorities: &[&str],
) -> Result<(), AppError> {
    if authorities.iter().any(|a| caller.has_authority(a)) {
        return Ok(());
    }
    Err(AppError::forbidden(
        "You do not have permission to access this resource",
    ))
}
