//! User data models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::UserId;
use crate::roles::Role;

/// A user as exposed by the API. The password hash never leaves the
/// repository layer.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

/// Login lookup row: id plus the stored bcrypt hash.
#[derive(FromRow, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub id: UserId,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Insert payload handed to the repository after hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Deserialize, Clone, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[validate(length(min = 1, max = 35))]
    pub surname: String,
    #[validate(length(min = 3, max = 35, message = "username must be 3 to 35 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    #[schema(example = "correct horse battery")]
    pub password: String,
}

impl std::fmt::Debug for RegisterRequestDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequestDto")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[validate(length(min = 1, max = 35))]
    pub surname: String,
}

/// Replaces a user's whole role set.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct SetRolesDto {
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub roles: Vec<Role>,
}
