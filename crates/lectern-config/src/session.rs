//! Session cookie and session store configuration.
//!
//! # Environment Variables
//!
//! Cookie:
//!
//! - `SESSION_SECRET`: signing key material, at least 32 bytes (required)
//! - `SESSION_NAME`: cookie name (default: `lectern_session`)
//! - `SESSION_KEY`: record slot holding the logged user id (default: `logged_user_id`)
//! - `SESSION_TTL_SECONDS`: lifetime of a session in the store (default: `86400`)
//! - `SESSION_COOKIE_SECURE`: set the `Secure` cookie attribute (default: `false`)
//!
//! Store:
//!
//! - `SESSION_STORE`: `redis` or `memory` (default: `redis`)
//! - `REDIS_URL`: connection URL, credentials included (default: `redis://127.0.0.1:6379`)
//! - `REDIS_CONNECTION_TIMEOUT_SECONDS`: bound on every store call (default: `5`)
//! - `SESSION_KEY_PREFIX`: namespace for session keys (default: `lectern`)
//!
//! Rotating `SESSION_SECRET` invalidates every outstanding session cookie.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

const MIN_SECRET_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    pub user_key: String,
    pub ttl: Duration,
    pub cookie_secure: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("user_key", &self.user_key)
            .field("ttl", &self.ttl)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let cookie_name = lookup("SESSION_NAME").unwrap_or_else(|| "lectern_session".into());
        if cookie_name.is_empty() || cookie_name.contains([';', '=', ' ']) {
            return Err(ConfigError::Invalid {
                name: "SESSION_NAME",
                reason: "not a valid cookie name".into(),
            });
        }

        Ok(Self {
            cookie_name,
            secret,
            user_key: lookup("SESSION_KEY").unwrap_or_else(|| "logged_user_id".into()),
            ttl: Duration::from_secs(
                lookup("SESSION_TTL_SECONDS")
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(86_400),
            ),
            cookie_secure: lookup("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

/// Which backend holds session records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionBackendKind {
    Redis,
    /// Process-local map. Sessions do not survive restarts and are not
    /// shared between instances.
    Memory,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SessionStoreConfig {
    pub backend: SessionBackendKind,
    pub redis_url: String,
    pub timeout: Duration,
    pub key_prefix: String,
}

impl fmt::Debug for SessionStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // redis_url may carry a password
        f.debug_struct("SessionStoreConfig")
            .field("backend", &self.backend)
            .field("timeout", &self.timeout)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackendKind::Redis,
            redis_url: "redis://127.0.0.1:6379".into(),
            timeout: Duration::from_secs(5),
            key_prefix: "lectern".into(),
        }
    }
}

impl SessionStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("SESSION_STORE").as_deref() {
            None | Some("redis") => SessionBackendKind::Redis,
            Some("memory") => SessionBackendKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SESSION_STORE",
                    reason: format!("unknown backend '{}'", other),
                });
            }
        };

        Ok(Self {
            backend,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            timeout: lookup("REDIS_CONNECTION_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            key_prefix: lookup("SESSION_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_session_config_requires_secret() {
        let err = SessionConfig::from_lookup(vars(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SESSION_SECRET"));
    }

    #[test]
    fn test_session_config_rejects_short_secret() {
        let err = SessionConfig::from_lookup(vars(&[("SESSION_SECRET", "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SESSION_SECRET", .. }));
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::from_lookup(vars(&[("SESSION_SECRET", SECRET)])).unwrap();
        assert_eq!(config.cookie_name, "lectern_session");
        assert_eq!(config.user_key, "logged_user_id");
        assert_eq!(config.ttl, Duration::from_secs(86_400));
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_session_config_rejects_bad_cookie_name() {
        let err = SessionConfig::from_lookup(vars(&[
            ("SESSION_SECRET", SECRET),
            ("SESSION_NAME", "bad name"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SESSION_NAME", .. }));
    }

    #[test]
    fn test_session_config_debug_hides_secret() {
        let config = SessionConfig::from_lookup(vars(&[("SESSION_SECRET", SECRET)])).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }

    #[test]
    fn test_store_config_parses_backend_and_timeout() {
        let config = SessionStoreConfig::from_lookup(vars(&[
            ("SESSION_STORE", "memory"),
            ("REDIS_CONNECTION_TIMEOUT_SECONDS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.backend, SessionBackendKind::Memory);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_store_config_zero_timeout_falls_back() {
        let config =
            SessionStoreConfig::from_lookup(vars(&[("REDIS_CONNECTION_TIMEOUT_SECONDS", "0")]))
                .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_store_config_rejects_unknown_backend() {
        assert!(SessionStoreConfig::from_lookup(vars(&[("SESSION_STORE", "etcd")])).is_err());
    }
}
