use axum::Json;
use axum::extract::{Path, State};
use lectern_core::AppError;
use lectern_models::UserId;
use tracing::instrument;

use super::model::{SetRolesDto, UserWithRoles};
use super::service::UserService;
use crate::middleware::auth::Principal;
use crate::modules::auth::model::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List users with their roles
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserWithRoles>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "ADMIN role required", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithRoles>>, AppError> {
    let users = UserService::get_users(&state).await?;
    Ok(Json(users))
}

/// Replace a user's role set
#[utoipa::path(
    put,
    path = "/api/users/{id}/roles",
    params(("id" = i64, Path, description = "User id")),
    request_body = SetRolesDto,
    responses(
        (status = 200, description = "Roles replaced", body = UserWithRoles),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "ADMIN role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
#[instrument(skip(state, principal, dto), fields(admin_id = %principal.user_id()))]
pub async fn set_user_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<SetRolesDto>,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = UserService::set_roles(&state, id, dto).await?;
    Ok(Json(user))
}
