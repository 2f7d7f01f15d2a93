//! Identity on top of the session store.
//!
//! A session either names a logged user or it does not. The user id sits in
//! the record under the configured user key; everything else about the
//! session is an implementation detail of [`SessionStore`].

use axum::http::HeaderMap;
use axum_extra::extract::cookie::SignedCookieJar;
use lectern_models::UserId;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::store::SessionStore;

#[derive(Clone, Debug)]
pub struct SessionManager {
    store: SessionStore,
    user_key: String,
}

impl SessionManager {
    pub fn new(store: SessionStore, user_key: impl Into<String>) -> Self {
        Self {
            store,
            user_key: user_key.into(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        self.store.jar(headers)
    }

    /// True only when the session resolves to a real user id.
    ///
    /// Store failures count as unauthenticated.
    pub async fn is_authenticated(&self, jar: &SignedCookieJar) -> bool {
        matches!(self.logged_user_id(jar).await, Ok(id) if !id.is_absent())
    }

    /// User id recorded in the request's session.
    ///
    /// A record whose user slot holds the reserved marker yields
    /// [`UserId::ABSENT`]. No cookie, no record, an empty slot or an
    /// unreachable store all yield [`SessionError::SessionUnresolvable`].
    pub async fn logged_user_id(&self, jar: &SignedCookieJar) -> Result<UserId, SessionError> {
        let record = match self.store.get(jar).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(SessionError::SessionUnresolvable),
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                return Err(SessionError::SessionUnresolvable);
            }
        };

        match record.get(&self.user_key).and_then(Value::as_i64) {
            Some(raw) => Ok(UserId::new(raw)),
            None => {
                debug!(session = ?record.id, "Session has no user id");
                Err(SessionError::SessionUnresolvable)
            }
        }
    }

    /// Binds `user_id` to a brand-new session.
    ///
    /// Whatever session the request carried is destroyed first, so an id
    /// planted before login never becomes authenticated.
    pub async fn set_logged_id(
        &self,
        jar: SignedCookieJar,
        user_id: UserId,
    ) -> Result<SignedCookieJar, SessionError> {
        let jar = match self.store.session_id(&jar) {
            Some(previous) => self.store.destroy(&previous, jar).await?,
            None => jar,
        };

        let (mut record, jar) = self.store.create(jar).await?;
        record.insert(self.user_key.clone(), user_id.get());
        let jar = self.store.save(&record, jar).await?;

        debug!(user_id = %user_id, session = ?record.id, "Session bound to user");
        Ok(jar)
    }

    /// Ends the request's session. Succeeds when there is none.
    pub async fn remove_logged_id(
        &self,
        jar: SignedCookieJar,
    ) -> Result<SignedCookieJar, SessionError> {
        match self.store.session_id(&jar) {
            Some(id) => self.store.destroy(&id, jar).await,
            None => Ok(self.store.forget(jar)),
        }
    }
}
