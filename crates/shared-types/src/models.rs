use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authority granting administrative access to any user resource.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Authority granting delivery-revision access.
pub const ROLE_INSTRUCTOR: &str = "ROLE_INSTRUCTOR";
/// Authority held by every enrolled learner.
pub const ROLE_STUDENT: &str = "ROLE_STUDENT";

/// An authority label. Many-to-many with users via `user_roles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub authority: String,
}

// Entity equality is id-based: two rows with the same id are the same role.
impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Role {}

/// A user row. The password hash stays in the database — the login
/// bootstrap reads it through its own projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for User {}

/// A user together with its materialized role set. This is the shape the
/// authorization decider and the lifecycle service work with.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithRoles {
    pub user: User,
    pub roles: Vec<Role>,
}

impl UserWithRoles {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    /// Exact authority-string scan over the role set.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.roles.iter().any(|r| r.authority == authority)
    }
}

/// A course offering template. Stable reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub img_uri: String,
    pub img_gray_uri: String,
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Course {}

/// One scheduled instance of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Offer {
    pub id: i64,
    pub edition: String,
    pub start_moment: DateTime<Utc>,
    pub end_moment: DateTime<Utc>,
    pub course_id: i64,
}

impl PartialEq for Offer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Offer {}

/// A lesson within an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub position: i32,
    pub offer_id: i64,
}

impl PartialEq for Lesson {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Lesson {}

/// The composite identity of an enrollment. Equality and hashing cover
/// both fields together; the pair is immutable once an enrollment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnrollmentKey {
    pub user_id: i64,
    pub offer_id: i64,
}

impl EnrollmentKey {
    pub fn new(user_id: i64, offer_id: i64) -> Self {
        Self { user_id, offer_id }
    }
}

/// The relationship entity linking one user to one offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Enrollment {
    pub user_id: i64,
    pub offer_id: i64,
    pub enroll_moment: DateTime<Utc>,
    pub refund_moment: Option<DateTime<Utc>>,
    pub available: bool,
    /// Once set, no fresh enrollment may ever be created for this pair;
    /// the row may only be updated.
    pub only_update: bool,
}

impl Enrollment {
    pub fn key(&self) -> EnrollmentKey {
        EnrollmentKey::new(self.user_id, self.offer_id)
    }
}

impl PartialEq for Enrollment {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Enrollment {}

/// Review state of a delivery. Stored as text in the `deliveries` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DeliverStatus {
    Pending,
    Accepted,
    Rejected,
}

impl DeliverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverStatus::Pending => "Pending",
            DeliverStatus::Accepted => "Accepted",
            DeliverStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(DeliverStatus::Pending),
            "Accepted" => Some(DeliverStatus::Accepted),
            "Rejected" => Some(DeliverStatus::Rejected),
            _ => None,
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        Self::from_str_opt(s).unwrap_or(DeliverStatus::Pending)
    }
}

/// A submission against a lesson, owned by an enrollment (user+offer pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Deliver {
    pub id: i64,
    pub uri: String,
    pub moment: DateTime<Utc>,
    pub status: String,
    pub feedback: Option<String>,
    pub correct_count: Option<i32>,
    pub lesson_id: i64,
    pub user_id: i64,
    pub offer_id: i64,
}

impl Deliver {
    pub fn status(&self) -> DeliverStatus {
        DeliverStatus::from_str_or_default(&self.status)
    }

    pub fn enrollment_key(&self) -> EnrollmentKey {
        EnrollmentKey::new(self.user_id, self.offer_id)
    }
}

impl PartialEq for Deliver {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Deliver {}

/// A discussion topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub moment: DateTime<Utc>,
    pub author_id: i64,
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Topic {}

/// A reply on a topic. The "liked by" user set lives in `reply_likes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Reply {
    pub id: i64,
    pub body: String,
    pub moment: DateTime<Utc>,
    pub topic_id: i64,
    pub author_id: i64,
}

impl PartialEq for Reply {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Reply {}
