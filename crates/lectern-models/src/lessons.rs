//! Lesson data models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{CourseId, LessonId};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub name: String,
    pub description: String,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateLessonDto {
    pub course_id: CourseId,
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateLessonDto {
    #[validate(length(min = 1, max = 35))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, IntoParams, ToSchema)]
pub struct LessonFilterParams {
    pub course_id: Option<CourseId>,
}
