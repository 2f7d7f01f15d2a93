//! Role-based authorization gate.
//!
//! Mount behind [`require_auth`](crate::middleware::auth::require_auth):
//!
//! ```rust,ignore
//! use axum::{Router, middleware, routing::post};
//! use crate::middleware::role::require_teacher;
//!
//! let teacher_routes = Router::new()
//!     .route("/", post(create_course))
//!     .route_layer(middleware::from_fn(require_teacher));
//! ```

use anyhow::anyhow;
use axum::{extract::Request, middleware::Next, response::Response};
use lectern_core::AppError;
use lectern_models::Role;
use tracing::{error, warn};

use crate::metrics::track_gate_rejection;
use crate::middleware::auth::Principal;

/// Admits the request only if its principal holds `required`.
///
/// A request that reaches this gate without a principal is a wiring error
/// and fails closed with 500.
pub async fn require_role(required: Role, req: Request, next: Next) -> Result<Response, AppError> {
    let Some(principal) = req.extensions().get::<Principal>() else {
        error!(
            method = %req.method(),
            path = %req.uri().path(),
            required = %required,
            "Role data missing: authorization gate mounted without authentication"
        );
        track_gate_rejection("authz");
        return Err(AppError::internal(anyhow!("Role data missing")));
    };

    if !principal.has_role(required) {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            user_id = %principal.user_id(),
            required = %required,
            "Authorization denied"
        );
        track_gate_rejection("authz");
        return Err(AppError::forbidden(anyhow!(
            "Access denied. Required role: {}",
            required
        )));
    }

    Ok(next.run(req).await)
}

pub async fn require_teacher(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(Role::Teacher, req, next).await
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(Role::Admin, req, next).await
}
