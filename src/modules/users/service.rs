use anyhow::anyhow;
use lectern_core::AppError;
use lectern_models::UserId;
use lectern_models::users::UserWithRoles;
use tracing::{info, instrument};

use super::model::SetRolesDto;
use crate::state::AppState;

pub struct UserService;

impl UserService {
    #[instrument(skip(state))]
    pub async fn get_users(state: &AppState) -> Result<Vec<UserWithRoles>, AppError> {
        state
            .users
            .list()
            .await
            .map_err(|e| AppError::new(e.status(), e))
    }

    #[instrument(skip(state))]
    pub async fn set_roles(
        state: &AppState,
        user_id: UserId,
        dto: SetRolesDto,
    ) -> Result<UserWithRoles, AppError> {
        let mut roles = dto.roles;
        roles.sort();
        roles.dedup();

        let found = state
            .users
            .set_roles(user_id, &roles)
            .await
            .map_err(|e| AppError::new(e.status(), e))?;
        if !found {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        let user = state
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AppError::new(e.status(), e))?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        info!(user_id = %user_id, roles = ?roles, "Roles replaced");
        Ok(UserWithRoles { user, roles })
    }
}
