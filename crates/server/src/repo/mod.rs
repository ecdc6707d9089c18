pub mod course;
pub mod deliver;
pub mod enrollment;
pub mod offer;
pub mod reply;
pub mod role;
pub mod user;
