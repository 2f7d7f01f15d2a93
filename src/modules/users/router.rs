use axum::{
    Router, middleware,
    routing::{get, put},
};

use super::controller::{get_users, set_user_roles};
use crate::middleware::auth::require_auth;
use crate::middleware::role::require_admin;
use crate::state::AppState;

/// Every route requires `ADMIN`.
pub fn init_users_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/{id}/roles", put(set_user_roles))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
