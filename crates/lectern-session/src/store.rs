//! Cookie-addressed session store.
//!
//! A client holds one signed cookie carrying only the session id. The
//! record itself lives in a [`SessionBackend`]. The signing key is derived
//! from the configured secret, so a cookie minted under another secret, or
//! edited by hand, reads as no session at all.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use lectern_config::SessionConfig;
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use crate::backend::SessionBackend;
use crate::error::SessionError;
use crate::keys::session_key;
use crate::record::{SessionId, SessionRecord, StoredValues};

/// Attempts at drawing an unused id before giving up.
const CREATE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    key: Key,
    cookie_name: String,
    cookie_secure: bool,
    ttl: Duration,
    prefix: String,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.cookie_name)
            .field("ttl", &self.ttl)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Derives the 64-byte cookie signing key from arbitrary secret material.
pub fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        config: &SessionConfig,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            key: signing_key(&config.secret),
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
            ttl: config.ttl,
            prefix: prefix.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Key the session cookie is signed with.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Verifying view over the request's cookies.
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Id named by a correctly signed session cookie, if any.
    pub fn session_id(&self, jar: &SignedCookieJar) -> Option<SessionId> {
        let cookie = jar.get(&self.cookie_name)?;
        let id = SessionId::parse(cookie.value());
        if id.is_none() {
            debug!(cookie = %self.cookie_name, "Signed cookie holds a malformed session id");
        }
        id
    }

    /// Fetches the record the request's cookie points at.
    ///
    /// `Ok(None)` covers a missing or forged cookie, an expired or destroyed
    /// record, and a record that no longer decodes.
    pub async fn get(&self, jar: &SignedCookieJar) -> Result<Option<SessionRecord>, SessionError> {
        let Some(id) = self.session_id(jar) else {
            return Ok(None);
        };

        let Some(raw) = self.backend.load(&session_key(&self.prefix, &id)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredValues>(&raw) {
            Ok(stored) => Ok(Some(SessionRecord::from_stored(id, stored))),
            Err(e) => {
                warn!(session = ?id, error = %e, "Discarding undecodable session record");
                Ok(None)
            }
        }
    }

    /// Creates an empty record under a fresh id and points the cookie at it.
    pub async fn create(
        &self,
        jar: SignedCookieJar,
    ) -> Result<(SessionRecord, SignedCookieJar), SessionError> {
        let body = serde_json::to_string(&StoredValues::default())?;

        for _ in 0..CREATE_ATTEMPTS {
            let id = SessionId::generate();
            let key = session_key(&self.prefix, &id);
            if self.backend.store_new(&key, &body, self.ttl).await? {
                debug!(session = ?id, "Session created");
                let jar = jar.add(self.cookie(&id));
                return Ok((SessionRecord::new(id), jar));
            }
        }

        Err(SessionError::StoreUnavailable(
            "could not allocate an unused session id".into(),
        ))
    }

    /// Persists the record, resetting its lifetime.
    pub async fn save(
        &self,
        record: &SessionRecord,
        jar: SignedCookieJar,
    ) -> Result<SignedCookieJar, SessionError> {
        let body = serde_json::to_string(&record.to_stored())?;
        self.backend
            .store(&session_key(&self.prefix, &record.id), &body, self.ttl)
            .await?;
        Ok(jar.add(self.cookie(&record.id)))
    }

    /// Deletes the record and tells the client to drop the cookie.
    pub async fn destroy(
        &self,
        id: &SessionId,
        jar: SignedCookieJar,
    ) -> Result<SignedCookieJar, SessionError> {
        self.backend.remove(&session_key(&self.prefix, id)).await?;
        debug!(session = ?id, "Session destroyed");
        Ok(self.forget(jar))
    }

    /// Drops the cookie without touching the store.
    pub fn forget(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/").build())
    }

    fn cookie(&self, id: &SessionId) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), id.as_str().to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;

    pub(crate) fn test_config() -> SessionConfig {
        SessionConfig {
            cookie_name: "lectern_session".into(),
            secret: "test-secret-test-secret-test-secret!".into(),
            user_key: "logged_user_id".into(),
            ttl: Duration::from_secs(60),
            cookie_secure: false,
        }
    }

    /// Carries the cookies set on `jar` into a fresh request header map,
    /// the way a browser would on its next request.
    pub(crate) fn next_request(jar: SignedCookieJar) -> HeaderMap {
        let response = jar.into_response();
        let mut headers = HeaderMap::new();
        let pairs: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter(|pair| !pair.ends_with('='))
            .map(str::to_owned)
            .collect();
        if !pairs.is_empty() {
            headers.insert(COOKIE, pairs.join("; ").parse().unwrap());
        }
        headers
    }

    fn store_with(backend: Arc<MemoryBackend>) -> SessionStore {
        SessionStore::new(backend, &test_config(), "test")
    }

    #[tokio::test]
    async fn test_get_without_cookie_is_none() {
        let store = store_with(Arc::new(MemoryBackend::new()));
        let jar = store.jar(&HeaderMap::new());
        assert!(store.get(&jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_save_and_get() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone());

        let jar = store.jar(&HeaderMap::new());
        let (mut record, jar) = store.create(jar).await.unwrap();
        record.insert("logged_user_id", 5);
        let jar = store.save(&record, jar).await.unwrap();
        assert_eq!(backend.len().await, 1);

        let headers = next_request(jar);
        let fetched = store.get(&store.jar(&headers)).await.unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_forged_cookie_reads_as_no_session() {
        let store = store_with(Arc::new(MemoryBackend::new()));
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("lectern_session={}", "ab".repeat(32)).parse().unwrap(),
        );
        let jar = store.jar(&headers);
        assert!(store.session_id(&jar).is_none());
        assert!(store.get(&jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cookie_from_other_secret_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone());
        let mut other_config = test_config();
        other_config.secret = "another-secret-another-secret-0000".into();
        let other = SessionStore::new(backend, &other_config, "test");

        let (record, jar) = store.create(store.jar(&HeaderMap::new())).await.unwrap();
        let jar = store.save(&record, jar).await.unwrap();
        let headers = next_request(jar);

        assert!(store.get(&store.jar(&headers)).await.unwrap().is_some());
        assert!(other.get(&other.jar(&headers)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_removes_record() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone());

        let (record, jar) = store.create(store.jar(&HeaderMap::new())).await.unwrap();
        let headers = next_request(jar);
        let jar = store.jar(&headers);

        store.destroy(&record.id, jar).await.unwrap();
        assert!(backend.is_empty().await);
        assert!(store.get(&store.jar(&headers)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_record_reads_as_none() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone());

        let (record, jar) = store.create(store.jar(&HeaderMap::new())).await.unwrap();
        backend
            .store(&session_key("test", &record.id), "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        let headers = next_request(jar);
        assert!(store.get(&store.jar(&headers)).await.unwrap().is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let store = store_with(Arc::new(MemoryBackend::new()));
        let cookie = store.cookie(&SessionId::generate());
        assert_eq!(cookie.name(), "lectern_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
