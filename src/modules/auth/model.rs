//! Account request and response bodies.

pub use lectern_models::auth::{LoginRequest, LoginResponse, MessageResponse};
pub use lectern_models::users::{RegisterRequestDto, UpdateProfileDto, UserWithRoles};

use utoipa::ToSchema;

/// Body of every error response.
#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
