//! Lesson data models and DTOs.

pub use lectern_models::lessons::{CreateLessonDto, Lesson, LessonFilterParams, UpdateLessonDto};
