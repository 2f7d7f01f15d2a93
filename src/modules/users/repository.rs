//! User persistence.
//!
//! Handlers and gates reach users only through [`UserRepository`], so the
//! HTTP layer can be exercised against [`InMemoryUserRepository`] without a
//! database.

use async_trait::async_trait;
use axum::http::StatusCode;
use lectern_models::users::{NewUser, UpdateProfileDto, User, UserCredentials, UserWithRoles};
use lectern_models::{Role, UserId};
use sqlx::{FromRow, PgPool};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn status(&self) -> StatusCode {
        match self {
            RepositoryError::UsernameTaken(_) => StatusCode::CONFLICT,
            RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Login lookup. Carries the stored password hash.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, RepositoryError>;

    /// Inserts the user together with its initial role set.
    async fn create(&self, user: NewUser, roles: &[Role]) -> Result<User, RepositoryError>;

    async fn update_profile(
        &self,
        id: UserId,
        dto: &UpdateProfileDto,
    ) -> Result<Option<User>, RepositoryError>;

    /// Returns whether a user was deleted.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<UserWithRoles>, RepositoryError>;

    /// Replaces the user's role set. Returns `false` if the user does not exist.
    async fn set_roles(&self, id: UserId, roles: &[Role]) -> Result<bool, RepositoryError>;
}

const USER_COLUMNS: &str = "id, name, surname, username, created_at, updated_at";

fn parse_roles(names: Vec<String>) -> Vec<Role> {
    names
        .into_iter()
        .filter_map(|name| match name.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!(error = %e, "Ignoring role unknown to this build");
                None
            }
        })
        .collect()
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct UserWithRoleNames {
    #[sqlx(flatten)]
    user: User,
    roles: Vec<String>,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(credentials)
    }

    async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, RepositoryError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.name",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(parse_roles(names))
    }

    async fn create(&self, user: NewUser, roles: &[Role]) -> Result<User, RepositoryError> {
        let mut tx = self.db.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, surname, username, password)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (username) DO NOTHING
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(created) = created else {
            tx.rollback().await?;
            return Err(RepositoryError::UsernameTaken(user.username));
        };

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = ANY($2)",
        )
        .bind(created.id)
        .bind(role_names(roles))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_profile(
        &self,
        id: UserId,
        dto: &UpdateProfileDto,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, surname = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&dto.name)
        .bind(&dto.surname)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<UserWithRoles>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserWithRoleNames>(
            "SELECT u.id, u.name, u.surname, u.username, u.created_at, u.updated_at,
                    COALESCE(
                        array_agg(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
                        '{}'
                    ) AS roles
             FROM users u
             LEFT JOIN user_roles ur ON ur.user_id = u.id
             LEFT JOIN roles r ON r.id = ur.role_id
             GROUP BY u.id
             ORDER BY u.id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserWithRoles {
                user: row.user,
                roles: parse_roles(row.roles),
            })
            .collect())
    }

    async fn set_roles(&self, id: UserId, roles: &[Role]) -> Result<bool, RepositoryError> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = ANY($2)",
        )
        .bind(id)
        .bind(role_names(roles))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryUserRepository;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;

    struct StoredUser {
        user: User,
        password_hash: String,
        roles: BTreeSet<Role>,
    }

    #[derive(Default)]
    struct Inner {
        next_id: i64,
        users: BTreeMap<UserId, StoredUser>,
    }

    /// Map-backed repository for tests.
    #[derive(Default)]
    pub struct InMemoryUserRepository {
        inner: Mutex<Inner>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            let inner = self.inner.lock().await;
            Ok(inner.users.get(&id).map(|s| s.user.clone()))
        }

        async fn find_credentials(
            &self,
            username: &str,
        ) -> Result<Option<UserCredentials>, RepositoryError> {
            let inner = self.inner.lock().await;
            Ok(inner
                .users
                .values()
                .find(|s| s.user.username == username)
                .map(|s| UserCredentials {
                    id: s.user.id,
                    username: s.user.username.clone(),
                    password: s.password_hash.clone(),
                }))
        }

        async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, RepositoryError> {
            let inner = self.inner.lock().await;
            Ok(inner
                .users
                .get(&id)
                .map(|s| s.roles.iter().copied().collect())
                .unwrap_or_default())
        }

        async fn create(&self, user: NewUser, roles: &[Role]) -> Result<User, RepositoryError> {
            let mut inner = self.inner.lock().await;
            if inner.users.values().any(|s| s.user.username == user.username) {
                return Err(RepositoryError::UsernameTaken(user.username));
            }

            inner.next_id += 1;
            let now = Utc::now();
            let created = User {
                id: UserId::new(inner.next_id),
                name: user.name,
                surname: user.surname,
                username: user.username,
                created_at: now,
                updated_at: now,
            };
            inner.users.insert(
                created.id,
                StoredUser {
                    user: created.clone(),
                    password_hash: user.password_hash,
                    roles: roles.iter().copied().collect(),
                },
            );

            Ok(created)
        }

        async fn update_profile(
            &self,
            id: UserId,
            dto: &UpdateProfileDto,
        ) -> Result<Option<User>, RepositoryError> {
            let mut inner = self.inner.lock().await;
            Ok(inner.users.get_mut(&id).map(|stored| {
                stored.user.name = dto.name.clone();
                stored.user.surname = dto.surname.clone();
                stored.user.updated_at = Utc::now();
                stored.user.clone()
            }))
        }

        async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
            Ok(self.inner.lock().await.users.remove(&id).is_some())
        }

        async fn list(&self) -> Result<Vec<UserWithRoles>, RepositoryError> {
            let inner = self.inner.lock().await;
            Ok(inner
                .users
                .values()
                .map(|s| UserWithRoles {
                    user: s.user.clone(),
                    roles: s.roles.iter().copied().collect(),
                })
                .collect())
        }

        async fn set_roles(&self, id: UserId, roles: &[Role]) -> Result<bool, RepositoryError> {
            let mut inner = self.inner.lock().await;
            Ok(match inner.users.get_mut(&id) {
                Some(stored) => {
                    stored.roles = roles.iter().copied().collect();
                    true
                }
                None => false,
            })
        }
    }
}
