//! Course data models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{CourseId, UserId};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    /// Difficulty estimate from 0 to 5.
    pub estimation: i32,
    pub lesson_count: i64,
    pub owner_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, max = 5))]
    #[serde(default)]
    pub estimation: i32,
}

/// Fields left out keep their current value.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 35))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 5))]
    pub estimation: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let dto: CreateCourseDto = serde_json::from_str(r#"{"name": "Rust 101"}"#).unwrap();
        assert_eq!(dto.description, "");
        assert_eq!(dto.estimation, 0);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_estimation_range() {
        let dto: CreateCourseDto =
            serde_json::from_str(r#"{"name": "Rust 101", "estimation": 6}"#).unwrap();
        assert!(dto.validate().is_err());

        let dto = UpdateCourseDto {
            estimation: Some(-1),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let dto = UpdateCourseDto::default();
        assert!(dto.validate().is_ok());
    }
}
