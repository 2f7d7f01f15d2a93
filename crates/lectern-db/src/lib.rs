//! # Lectern DB
//!
//! PostgreSQL pool initialisation and schema migrations.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
//!
//! # Example
//!
//! ```ignore
//! let pool = lectern_db::init_db_pool().await?;
//! lectern_db::run_migrations(&pool).await?;
//! ```

use std::env;

use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Connects a PostgreSQL pool using `DATABASE_URL`.
pub async fn init_db_pool() -> Result<PgPool, sqlx::Error> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;

    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies the migrations embedded from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
