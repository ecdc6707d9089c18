use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, Course, Offer};

use crate::repo;

/// GET /api/courses
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses", body = [Course])
    ),
    tag = "courses"
)]
pub async fn list_courses(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repo::course::list(&pool).await?;
    Ok(Json(courses))
}

/// GET /api/courses/{id}
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "courses"
)]
pub async fn get_course(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    let course = repo::course::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    Ok(Json(course))
}

/// GET /api/courses/{id}/offers
#[utoipa::path(
    get,
    path = "/api/courses/{id}/offers",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course's scheduled offers", body = [Offer]),
        (status = 404, description = "Course not found", body = AppError)
    ),
    tag = "courses"
)]
pub async fn list_course_offers(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Offer>>, AppError> {
    if repo::course::find_by_id(&pool, id).await?.is_none() {
        return Err(AppError::not_found("Course not found"));
    }

    let offers = repo::offer::list_by_course(&pool, id).await?;
    Ok(Json(offers))
}
