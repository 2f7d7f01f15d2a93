//! Account and role administration against the database.

use lectern_core::hash_password;
use lectern_models::{Role, UserId};
use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("user '{0}' already exists")]
    UsernameTaken(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("role {0} is not provisioned in the database")]
    RoleMissing(Role),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Creates an account holding both `ADMIN` and `USER`.
pub async fn create_admin(
    db: &PgPool,
    name: &str,
    surname: &str,
    username: &str,
    password: &str,
) -> Result<UserId, AdminError> {
    let password_hash = hash_password(password).map_err(|e| AdminError::Hash(e.error.to_string()))?;

    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (name, surname, username, password)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (username) DO NOTHING
         RETURNING id",
    )
    .bind(name)
    .bind(surname)
    .bind(username)
    .bind(&password_hash)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        tx.rollback().await?;
        return Err(AdminError::UsernameTaken(username.to_string()));
    };

    for role in [Role::Admin, Role::User] {
        let granted = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = $2
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;

        if granted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AdminError::RoleMissing(role));
        }
    }

    tx.commit().await?;

    Ok(user_id)
}

async fn find_user_id(db: &PgPool, username: &str) -> Result<UserId, AdminError> {
    sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(username.to_string()))
}

/// Adds `role` to the user. Returns `false` if the user already held it.
pub async fn grant_role(db: &PgPool, username: &str, role: Role) -> Result<bool, AdminError> {
    let user_id = find_user_id(db, username).await?;

    let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
        .bind(role.as_str())
        .fetch_optional(db)
        .await?
        .ok_or(AdminError::RoleMissing(role))?;

    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
         ON CONFLICT (user_id, role_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Removes `role` from the user. Returns `false` if the user did not hold it.
pub async fn revoke_role(db: &PgPool, username: &str, role: Role) -> Result<bool, AdminError> {
    let user_id = find_user_id(db, username).await?;

    let result = sqlx::query(
        "DELETE FROM user_roles
         WHERE user_id = $1
           AND role_id = (SELECT id FROM roles WHERE name = $2)",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}
