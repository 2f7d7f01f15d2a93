//! Process-local session backend.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::SessionBackend;
use crate::error::SessionError;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Sessions held in a map, with expiry checked on access.
///
/// Expired entries that are never read again are dropped by
/// [`MemoryBackend::purge_expired`], which [`MemoryBackend::spawn_sweeper`]
/// runs periodically. Suited to single-instance deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired records.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Purges expired entries every `every` until the backend is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) {
        let backend: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let Some(backend) = backend.upgrade() else {
                    break;
                };
                let purged = backend.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Swept expired in-memory sessions");
                }
            }
        });
    }

    #[cfg(test)]
    async fn raw_len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn store_new(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Backend whose every call fails as an unreachable store would.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl SessionBackend for UnavailableBackend {
    async fn load(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::StoreUnavailable("connection refused".into()))
    }

    async fn store(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), SessionError> {
        Err(SessionError::StoreUnavailable("connection refused".into()))
    }

    async fn store_new(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<bool, SessionError> {
        Err(SessionError::StoreUnavailable("connection refused".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::StoreUnavailable("connection refused".into()))
    }
}
