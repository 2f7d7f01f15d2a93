use anyhow::anyhow;
use lectern_core::{AppError, dummy_hash, hash_password, verify_password};
use lectern_models::users::{NewUser, UserCredentials, UserWithRoles};
use lectern_models::{Role, UserId};
use tracing::{info, instrument, warn};

use crate::metrics::{track_login_failure, track_login_success, track_user_registered};
use crate::modules::users::repository::{RepositoryError, UserRepository};
use crate::state::AppState;

use super::model::{LoginRequest, RegisterRequestDto, UpdateProfileDto};

/// Roles every self-registered account starts with.
const DEFAULT_ROLES: &[Role] = &[Role::User];

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Id of the account if `password` matches it.
///
/// A missing account is verified against a dummy hash so that an unknown
/// username and a wrong password take the same time to reject.
fn check_password<V>(
    credentials: Option<&UserCredentials>,
    password: &str,
    mut verify: V,
) -> Result<Option<UserId>, AppError>
where
    V: FnMut(&str, &str) -> Result<bool, AppError>,
{
    match credentials {
        Some(credentials) => Ok(verify(password, &credentials.password)?.then_some(credentials.id)),
        None => {
            verify(password, dummy_hash()?)?;
            Ok(None)
        }
    }
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(state, dto), fields(username = %dto.username))]
    pub async fn register_user(
        state: &AppState,
        dto: RegisterRequestDto,
    ) -> Result<UserWithRoles, AppError> {
        let password_hash = hash_password(&dto.password)?;

        let user = state
            .users
            .create(
                NewUser {
                    name: dto.name,
                    surname: dto.surname,
                    username: dto.username,
                    password_hash,
                },
                DEFAULT_ROLES,
            )
            .await
            .map_err(|e| AppError::new(e.status(), e))?;

        info!(user_id = %user.id, "User registered");
        track_user_registered();

        Ok(UserWithRoles {
            user,
            roles: DEFAULT_ROLES.to_vec(),
        })
    }

    /// Checks credentials and returns the matching account.
    ///
    /// An unknown username and a wrong password produce the same error.
    #[instrument(skip(users, dto), fields(username = %dto.username))]
    pub async fn verify_credentials(
        users: &dyn UserRepository,
        dto: &LoginRequest,
    ) -> Result<UserWithRoles, AppError> {
        let repo_err = |e: RepositoryError| AppError::new(e.status(), e);

        let credentials = users.find_credentials(&dto.username).await.map_err(repo_err)?;
        let known = credentials.is_some();

        let Some(user_id) = check_password(credentials.as_ref(), &dto.password, verify_password)?
        else {
            if known {
                warn!(reason = "password mismatch", "Login rejected");
                track_login_failure("bad_password");
            } else {
                warn!(reason = "unknown username", "Login rejected");
                track_login_failure("unknown_user");
            }
            return Err(AppError::unauthorized(anyhow!(INVALID_CREDENTIALS)));
        };

        let user = users
            .find_by_id(user_id)
            .await
            .map_err(repo_err)?
            .ok_or_else(|| AppError::unauthorized(anyhow!(INVALID_CREDENTIALS)))?;
        let roles = users.roles_of(user_id).await.map_err(repo_err)?;

        track_login_success();
        Ok(UserWithRoles { user, roles })
    }

    #[instrument(skip(state, dto))]
    pub async fn update_profile(
        state: &AppState,
        user_id: UserId,
        dto: &UpdateProfileDto,
    ) -> Result<UserWithRoles, AppError> {
        let user = state
            .users
            .update_profile(user_id, dto)
            .await
            .map_err(|e| AppError::new(e.status(), e))?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
        let roles = state
            .users
            .roles_of(user_id)
            .await
            .map_err(|e| AppError::new(e.status(), e))?;

        Ok(UserWithRoles { user, roles })
    }

    #[instrument(skip(state))]
    pub async fn delete_account(state: &AppState, user_id: UserId) -> Result<(), AppError> {
        let deleted = state
            .users
            .delete(user_id)
            .await
            .map_err(|e| AppError::new(e.status(), e))?;

        if !deleted {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(password: &str) -> UserCredentials {
        UserCredentials {
            id: UserId::new(7),
            username: "alice".into(),
            password: hash_password(password).unwrap(),
        }
    }

    #[test]
    fn test_unknown_user_still_runs_the_verifier() {
        let mut calls = 0;
        let result = check_password(None, "anything", |password, hash| {
            calls += 1;
            verify_password(password, hash)
        })
        .unwrap();

        assert_eq!(result, None);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_both_rejections_verify_once() {
        let stored = credentials("s3cret-pass");

        let mut miss_calls = 0;
        let mut mismatch_calls = 0;
        check_password(None, "wrong-pass", |p, h| {
            miss_calls += 1;
            verify_password(p, h)
        })
        .unwrap();
        check_password(Some(&stored), "wrong-pass", |p, h| {
            mismatch_calls += 1;
            verify_password(p, h)
        })
        .unwrap();

        assert_eq!(miss_calls, mismatch_calls);
    }

    #[test]
    fn test_matching_password_returns_id() {
        let stored = credentials("s3cret-pass");
        let id = check_password(Some(&stored), "s3cret-pass", verify_password).unwrap();
        assert_eq!(id, Some(UserId::new(7)));
        assert_eq!(
            check_password(Some(&stored), "wrong-pass", verify_password).unwrap(),
            None
        );
    }
}
