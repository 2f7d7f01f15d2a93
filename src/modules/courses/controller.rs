use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use lectern_core::AppError;
use lectern_models::CourseId;
use tracing::instrument;

use super::model::{Course, CreateCourseDto, UpdateCourseDto};
use super::service::CourseService;
use crate::middleware::auth::Principal;
use crate::modules::auth::model::{ErrorResponse, MessageResponse};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List all courses
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses", body = Vec<Course>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::get_courses(&state.db).await?;
    Ok(Json(courses))
}

/// Get a course by id
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = Course),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<CourseId>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course(&state.db, id).await?;
    Ok(Json(course))
}

/// Create a course owned by the caller
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, principal, dto), fields(user_id = %principal.user_id()))]
pub async fn create_course(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, principal.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Update a course the caller owns
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role and ownership required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, principal, dto), fields(user_id = %principal.user_id()))]
pub async fn update_course(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::update_course(&state.db, principal.user_id(), id, dto).await?;
    Ok(Json(course))
}

/// Delete a course the caller owns, with its lessons
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role and ownership required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, principal), fields(user_id = %principal.user_id()))]
pub async fn delete_course(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete_course(&state.db, principal.user_id(), id).await?;
    Ok(Json(MessageResponse::new("Course deleted")))
}
