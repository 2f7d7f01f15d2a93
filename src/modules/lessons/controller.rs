use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use lectern_core::AppError;
use lectern_models::LessonId;
use tracing::instrument;

use super::model::{CreateLessonDto, Lesson, LessonFilterParams, UpdateLessonDto};
use super::service::LessonService;
use crate::middleware::auth::Principal;
use crate::modules::auth::model::{ErrorResponse, MessageResponse};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List lessons, optionally for one course
#[utoipa::path(
    get,
    path = "/api/lessons",
    params(LessonFilterParams),
    responses(
        (status = 200, description = "Matching lessons", body = Vec<Lesson>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lessons(
    State(state): State<AppState>,
    Query(filters): Query<LessonFilterParams>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = LessonService::get_lessons(&state.db, filters).await?;
    Ok(Json(lessons))
}

/// Get a lesson by id
#[utoipa::path(
    get,
    path = "/api/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "The lesson", body = Lesson),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<LessonId>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::get_lesson(&state.db, id).await?;
    Ok(Json(lesson))
}

/// Add a lesson to a course the caller owns
#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role and course ownership required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, principal, dto), fields(user_id = %principal.user_id()))]
pub async fn create_lesson(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = LessonService::create_lesson(&state.db, principal.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Update a lesson in a course the caller owns
#[utoipa::path(
    put,
    path = "/api/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = UpdateLessonDto,
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role and course ownership required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, principal, dto), fields(user_id = %principal.user_id()))]
pub async fn update_lesson(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<LessonId>,
    ValidatedJson(dto): ValidatedJson<UpdateLessonDto>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::update_lesson(&state.db, principal.user_id(), id, dto).await?;
    Ok(Json(lesson))
}

/// Delete a lesson from a course the caller owns
#[utoipa::path(
    delete,
    path = "/api/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "TEACHER role and course ownership required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, principal), fields(user_id = %principal.user_id()))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<LessonId>,
) -> Result<Json<MessageResponse>, AppError> {
    LessonService::delete_lesson(&state.db, principal.user_id(), id).await?;
    Ok(Json(MessageResponse::new("Lesson deleted")))
}
