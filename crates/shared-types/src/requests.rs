use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "validation")]
use validator::Validate;

use crate::models::{Role, UserWithRoles};

/// A role reference in a user payload: by id, by authority name, or both.
/// Which one is honored depends on the configured lookup mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

/// Body shape shared by `POST /api/users` and `PUT /api/users/{id}`.
/// The role set is replaced wholesale on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UserUpsertRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Valid email is required"))
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 6, message = "Password must be at least 6 characters"))
    )]
    pub password: String,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

/// Query parameters for the user listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct UserListParams {
    /// Case-insensitive substring filter on the display name.
    pub name: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Role projection in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleResponse {
    pub id: i64,
    pub authority: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            authority: role.authority,
        }
    }
}

/// User projection in API responses. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleResponse>,
}

impl From<UserWithRoles> for UserResponse {
    fn from(value: UserWithRoles) -> Self {
        Self {
            id: value.user.id,
            name: value.user.name,
            email: value.user.email,
            roles: value.roles.into_iter().map(RoleResponse::from).collect(),
        }
    }
}

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after successful authentication or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Admin request to enroll a user into an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateEnrollmentRequest {
    pub user_id: i64,
    pub offer_id: i64,
    #[serde(default)]
    pub available: Option<bool>,
}

/// Admin request to mutate an enrollment's flags. The (user, offer) key
/// itself is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateEnrollmentRequest {
    #[serde(default)]
    pub refund_moment: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub only_update: Option<bool>,
}

/// One row of a user's enrollment listing: the offer joined with its course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct EnrollmentSummary {
    pub offer_id: i64,
    pub course_name: String,
    pub edition: String,
    pub start_moment: DateTime<Utc>,
    pub end_moment: DateTime<Utc>,
    pub img_uri: String,
    pub img_gray_uri: String,
}

/// Student submission of work against a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct SubmitDeliverRequest {
    pub lesson_id: i64,
    pub offer_id: i64,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "A submission URI is required"))
    )]
    pub uri: String,
}

/// Instructor revision of a delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeliverFeedbackRequest {
    pub status: String,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub correct_count: Option<i32>,
}

/// Body for posting a reply on a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateReplyRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Reply body is required"))
    )]
    pub body: String,
}

/// A reply joined with its author name and like count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ReplyResponse {
    pub id: i64,
    pub body: String,
    pub moment: DateTime<Utc>,
    pub topic_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    #[test]
    fn user_response_projects_roles() {
        let value = UserWithRoles {
            user: User {
                id: 1,
                name: "Alex Brown".to_string(),
                email: "alex@studyline.dev".to_string(),
            },
            roles: vec![Role {
                id: 1,
                authority: "ROLE_STUDENT".to_string(),
            }],
        };
        let resp = UserResponse::from(value);
        assert_eq!(resp.id, 1);
        assert_eq!(resp.roles.len(), 1);
        assert_eq!(resp.roles[0].authority, "ROLE_STUDENT");
    }

    #[test]
    fn role_ref_accepts_id_or_authority() {
        let by_id: RoleRef = serde_json::from_str(r#"{"id":2}"#).unwrap();
        assert_eq!(by_id.id, Some(2));
        assert_eq!(by_id.authority, None);

        let by_name: RoleRef = serde_json::from_str(r#"{"authority":"ROLE_ADMIN"}"#).unwrap();
        assert_eq!(by_name.id, None);
        assert_eq!(by_name.authority.as_deref(), Some("ROLE_ADMIN"));
    }

    #[test]
    fn upsert_request_roles_default_to_empty() {
        let req: UserUpsertRequest = serde_json::from_str(
            r#"{"name":"Alex","email":"alex@studyline.dev","password":"123456"}"#,
        )
        .unwrap();
        assert!(req.roles.is_empty());
    }

    #[cfg(feature = "validation")]
    #[test]
    fn upsert_request_validation() {
        use validator::Validate;

        let bad = UserUpsertRequest {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            roles: vec![],
        };
        let errs = bad.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("name"));
        assert!(errs.field_errors().contains_key("email"));
        assert!(errs.field_errors().contains_key("password"));
    }
}
