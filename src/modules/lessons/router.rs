use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::controller::{create_lesson, delete_lesson, get_lesson, get_lessons, update_lesson};
use crate::middleware::auth::require_auth;
use crate::middleware::role::require_teacher;
use crate::state::AppState;

/// Reads need a session; writes also need `TEACHER`.
pub fn init_lessons_router(state: AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/", get(get_lessons))
        .route("/{id}", get(get_lesson));

    let write = Router::new()
        .route("/", post(create_lesson))
        .route("/{id}", put(update_lesson).delete(delete_lesson))
        .route_layer(middleware::from_fn(require_teacher));

    read.merge(write)
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
