//! Course data models and DTOs.

pub use lectern_models::courses::{Course, CreateCourseDto, UpdateCourseDto};
