use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use lectern_config::{
    CorsConfig, RateLimitConfig, SessionBackendKind, SessionConfig, SessionStoreConfig,
};
use lectern_session::{MemoryBackend, RedisBackend, SessionBackend, SessionManager, SessionStore};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::middleware::rate_limit::Throttle;
use crate::modules::users::repository::{PgUserRepository, UserRepository};

const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionManager,
    pub throttle: Throttle,
    pub cors_config: CorsConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("throttle", &self.throttle)
            .field("cors_config", &self.cors_config)
            .finish_non_exhaustive()
    }
}

/// Lets handlers take a `SignedCookieJar` extractor directly.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.store().key().clone()
    }
}

impl AppState {
    pub fn new(
        db: PgPool,
        users: Arc<dyn UserRepository>,
        sessions: SessionManager,
        rate_limit_config: &RateLimitConfig,
        cors_config: CorsConfig,
    ) -> Self {
        Self {
            db,
            users,
            sessions,
            throttle: Throttle::from_config(rate_limit_config),
            cors_config,
        }
    }
}

/// Connects the configured session backend.
pub async fn connect_session_backend(
    config: &SessionStoreConfig,
) -> anyhow::Result<Arc<dyn SessionBackend>> {
    let backend: Arc<dyn SessionBackend> = match config.backend {
        SessionBackendKind::Redis => {
            let backend = RedisBackend::connect(&config.redis_url, config.timeout)
                .await
                .context("Failed to connect to the Redis session store")?;
            info!(timeout = ?config.timeout, "Redis session store connected");
            Arc::new(backend)
        }
        SessionBackendKind::Memory => {
            warn!("Using in-process session store; sessions are lost on restart");
            let backend = Arc::new(MemoryBackend::new());
            backend.spawn_sweeper(MEMORY_SWEEP_INTERVAL);
            backend
        }
    };
    Ok(backend)
}

pub async fn init_app_state(db: PgPool) -> anyhow::Result<AppState> {
    let session_config = SessionConfig::from_env().context("Invalid session configuration")?;
    let store_config =
        SessionStoreConfig::from_env().context("Invalid session store configuration")?;
    let rate_limit_config = RateLimitConfig::from_env();

    // Warm the dummy hash before the first login arrives.
    lectern_core::dummy_hash().map_err(|e| e.error)?;

    let backend = connect_session_backend(&store_config).await?;
    let store = SessionStore::new(backend, &session_config, store_config.key_prefix.clone());
    let sessions = SessionManager::new(store, session_config.user_key.clone());

    info!(
        mode = ?rate_limit_config.mode,
        tick_ms = rate_limit_config.tick.as_millis() as u64,
        burst = rate_limit_config.burst.get(),
        "Rate limiter configured"
    );

    let state = AppState::new(
        db.clone(),
        Arc::new(PgUserRepository::new(db)),
        sessions,
        &rate_limit_config,
        CorsConfig::from_env(),
    );
    state.throttle.spawn_pruner(Duration::from_secs(60));

    Ok(state)
}
