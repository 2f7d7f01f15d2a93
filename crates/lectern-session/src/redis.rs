//! Redis session backend.
//!
//! Every call is bounded by the configured timeout. A timeout or a Redis
//! error surfaces as [`SessionError::StoreUnavailable`]; nothing here blocks
//! a request indefinitely.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use tracing::{debug, error, instrument};

use crate::backend::SessionBackend;
use crate::error::SessionError;

#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    timeout: Duration,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Opens a managed connection to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StoreUnavailable` if the URL is malformed or the
    /// server cannot be reached within `timeout`.
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client =
            Client::open(redis_url).map_err(|e| SessionError::StoreUnavailable(e.to_string()))?;

        let conn = match tokio::time::timeout(timeout, ConnectionManager::new(client)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(SessionError::StoreUnavailable(e.to_string())),
            Err(_) => {
                return Err(SessionError::StoreUnavailable(format!(
                    "connect timed out after {:?}",
                    timeout
                )));
            }
        };

        Ok(Self { conn, timeout })
    }

    async fn bounded<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(session.op = op, session.key = %key, error = %e, "Redis error");
                Err(SessionError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                error!(session.op = op, session.key = %key, timeout = ?self.timeout, "Redis call timed out");
                Err(SessionError::StoreUnavailable(format!(
                    "{} timed out after {:?}",
                    op, self.timeout
                )))
            }
        }
    }
}

/// Redis expiry granularity is one second; never send zero.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SessionBackend for RedisBackend {
    #[instrument(skip(self), fields(session.operation = "GET"))]
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.conn.clone();
        let value = self
            .bounded("GET", key, conn.get::<_, Option<String>>(key))
            .await?;
        debug!(session.key = %key, hit = value.is_some(), "Session load");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(session.operation = "SETEX"))]
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        self.bounded(
            "SETEX",
            key,
            conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)),
        )
        .await
    }

    #[instrument(skip(self, value), fields(session.operation = "SET NX"))]
    async fn store_new(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_secs(ttl)).arg("NX");

        let reply: Option<String> = self
            .bounded("SET NX", key, cmd.query_async(&mut conn))
            .await?;
        Ok(reply.is_some())
    }

    #[instrument(skip(self), fields(session.operation = "DEL"))]
    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        self.bounded("DEL", key, conn.del::<_, ()>(key)).await
    }
}
