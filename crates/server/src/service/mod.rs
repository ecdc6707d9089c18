pub mod access;
pub mod enrollments;
pub mod users;
