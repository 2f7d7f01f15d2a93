//! User data models and DTOs.

pub use lectern_models::users::{SetRolesDto, User, UserWithRoles};
