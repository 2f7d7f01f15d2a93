use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::SignedCookieJar;
use lectern_core::AppError;
use tracing::{info, instrument};

use super::model::{
    ErrorResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequestDto,
    UpdateProfileDto, UserWithRoles,
};
use super::service::AuthService;
use crate::metrics::{track_session_created, track_session_destroyed};
use crate::middleware::auth::Principal;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = UserWithRoles),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<UserWithRoles>), AppError> {
    let user = AuthService::register_user(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a session cookie
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; session cookie set", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Session store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(SignedCookieJar, Json<LoginResponse>), AppError> {
    let user = AuthService::verify_credentials(state.users.as_ref(), &dto).await?;

    let jar = state
        .sessions
        .set_logged_id(jar, user.user.id)
        .await
        .map_err(|e| AppError::new(e.status(), e))?;

    info!(user_id = %user.user.id, "User logged in");
    track_session_created();

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session destroyed", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Session store unavailable", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, principal), fields(user_id = %principal.user_id()))]
pub async fn logout_user(
    State(state): State<AppState>,
    principal: Principal,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<MessageResponse>), AppError> {
    let jar = state
        .sessions
        .remove_logged_id(jar)
        .await
        .map_err(|e| AppError::new(e.status(), e))?;

    info!("User logged out");
    track_session_destroyed();

    Ok((jar, Json(MessageResponse::new("Logged out"))))
}

/// Current user with roles
#[utoipa::path(
    get,
    path = "/api/auth/who-am-i",
    responses(
        (status = 200, description = "The authenticated user", body = UserWithRoles),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Authentication"
)]
pub async fn who_am_i(principal: Principal) -> Json<UserWithRoles> {
    Json(principal.to_user_with_roles())
}

/// Update own name and surname
#[utoipa::path(
    put,
    path = "/api/auth/update",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = UserWithRoles),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, principal, dto), fields(user_id = %principal.user_id()))]
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = AuthService::update_profile(&state, principal.user_id(), &dto).await?;
    Ok(Json(user))
}

/// Delete own account and end the session
#[utoipa::path(
    delete,
    path = "/api/auth/delete",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, principal, jar), fields(user_id = %principal.user_id()))]
pub async fn delete_account(
    State(state): State<AppState>,
    principal: Principal,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<MessageResponse>), AppError> {
    AuthService::delete_account(&state, principal.user_id()).await?;

    let jar = state
        .sessions
        .remove_logged_id(jar)
        .await
        .map_err(|e| AppError::new(e.status(), e))?;
    track_session_destroyed();

    Ok((jar, Json(MessageResponse::new("Account deleted"))))
}
