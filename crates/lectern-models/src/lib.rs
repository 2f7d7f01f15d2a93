//! # Lectern Models
//!
//! Domain entities and request/response DTOs shared by the API, the session
//! layer and the CLI.
//!
//! - [`ids`]: typed `i64` identifiers
//! - [`roles`]: the [`Role`] set used for authorization
//! - [`users`], [`courses`], [`lessons`]: entities and DTOs
//! - [`auth`]: login bodies

pub mod auth;
pub mod courses;
pub mod ids;
pub mod lessons;
pub mod roles;
pub mod users;

pub use ids::{CourseId, LessonId, UserId};
pub use roles::Role;
