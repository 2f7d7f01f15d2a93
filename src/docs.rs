use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{
    ErrorResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequestDto,
    UpdateProfileDto, UserWithRoles,
};
use crate::modules::courses::model::{Course, CreateCourseDto, UpdateCourseDto};
use crate::modules::lessons::model::{
    CreateLessonDto, Lesson, LessonFilterParams, UpdateLessonDto,
};
use crate::modules::users::model::{SetRolesDto, User};
use lectern_models::Role;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::who_am_i,
        crate::modules::auth::controller::update_profile,
        crate::modules::auth::controller::delete_account,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::set_user_roles,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::lessons::controller::get_lessons,
        crate::modules::lessons::controller::get_lesson,
        crate::modules::lessons::controller::create_lesson,
        crate::modules::lessons::controller::update_lesson,
        crate::modules::lessons::controller::delete_lesson,
    ),
    components(
        schemas(
            User,
            UserWithRoles,
            Role,
            RegisterRequestDto,
            UpdateProfileDto,
            SetRolesDto,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            ErrorResponse,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            Lesson,
            CreateLessonDto,
            UpdateLessonDto,
            LessonFilterParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and session endpoints"),
        (name = "Users", description = "User administration (ADMIN)"),
        (name = "Courses", description = "Course management"),
        (name = "Lessons", description = "Lesson management")
    ),
    info(
        title = "Lectern API",
        version = "0.1.0",
        description = "Course and lesson management REST API with cookie-based sessions.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let cookie_name = std::env::var("SESSION_NAME")
                .unwrap_or_else(|_| "lectern_session".to_string());
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(cookie_name))),
            )
        }
    }
}
