//! Authentication gate and the [`Principal`] it resolves.
//!
//! [`require_auth`] runs in front of every route that needs an identity. It
//! reads the session, loads the user and their roles once, and stores the
//! result in the request extensions. Everything downstream, the role gate
//! included, reads identity from there and never from the session again.

use std::collections::BTreeSet;

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use lectern_core::AppError;
use lectern_models::users::{User, UserWithRoles};
use lectern_models::{Role, UserId};
use tracing::{error, warn};

use crate::metrics::track_gate_rejection;
use crate::state::AppState;

/// Identity of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user: User,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(user: User, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Exact membership. Holding `ADMIN` does not imply `TEACHER`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn to_user_with_roles(&self) -> UserWithRoles {
        UserWithRoles {
            user: self.user.clone(),
            roles: self.roles.iter().copied().collect(),
        }
    }
}

/// Rejects requests without a live session and attaches the [`Principal`].
///
/// A session pointing at a user that has since been deleted is rejected the
/// same way as no session at all.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let jar = state.sessions.jar(req.headers());
    let user_id = match state.sessions.logged_user_id(&jar).await {
        Ok(id) if !id.is_absent() => id,
        Ok(_) | Err(_) => {
            warn!(method = %method, path = %path, reason = "no session", "Authentication rejected");
            track_gate_rejection("authn");
            return Err(AppError::unauthorized(anyhow!("Authentication required")));
        }
    };

    let user = state.users.find_by_id(user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "Failed to load session user");
        AppError::new(e.status(), e)
    })?;

    let Some(user) = user else {
        warn!(
            method = %method,
            path = %path,
            user_id = %user_id,
            reason = "user no longer exists",
            "Authentication rejected"
        );
        track_gate_rejection("authn");
        return Err(AppError::unauthorized(anyhow!("Authentication required")));
    };

    let roles = state
        .users
        .roles_of(user_id)
        .await
        .map_err(|e| AppError::new(e.status(), e))?;

    req.extensions_mut().insert(Principal::new(user, roles));

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "Handler reached without authentication gate");
            AppError::internal(anyhow!("Principal missing from request"))
        })
    }
}
