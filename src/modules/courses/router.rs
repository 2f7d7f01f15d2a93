use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::controller::{create_course, delete_course, get_course, get_courses, update_course};
use crate::middleware::auth::require_auth;
use crate::middleware::role::require_teacher;
use crate::state::AppState;

/// Reads need a session; writes also need `TEACHER`.
pub fn init_courses_router(state: AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/", get(get_courses))
        .route("/{id}", get(get_course));

    let write = Router::new()
        .route("/", post(create_course))
        .route("/{id}", put(update_course).delete(delete_course))
        .route_layer(middleware::from_fn(require_teacher));

    read.merge(write)
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
