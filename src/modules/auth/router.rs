use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use super::controller::{
    delete_account, login_user, logout_user, register_user, update_profile, who_am_i,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// `/register` and `/login` are public; the rest sit behind the
/// authentication gate.
pub fn init_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user));

    let protected = Router::new()
        .route("/logout", post(logout_user))
        .route("/who-am-i", get(who_am_i))
        .route("/update", put(update_profile))
        .route("/delete", delete(delete_account))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}
