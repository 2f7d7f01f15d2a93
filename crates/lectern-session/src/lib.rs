//! # Lectern Session
//!
//! Server-side sessions addressed by a signed cookie.
//!
//! - [`SessionBackend`]: where records live ([`RedisBackend`], [`MemoryBackend`])
//! - [`SessionStore`]: cookie handling and record encoding
//! - [`SessionManager`]: the logged-user view the HTTP layer works with
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lectern_session::{RedisBackend, SessionManager, SessionStore};
//!
//! let backend = RedisBackend::connect(&store_config.redis_url, store_config.timeout).await?;
//! let store = SessionStore::new(Arc::new(backend), &session_config, &store_config.key_prefix);
//! let sessions = SessionManager::new(store, &session_config.user_key);
//!
//! let jar = sessions.jar(request.headers());
//! if sessions.is_authenticated(&jar).await { /* ... */ }
//! ```

pub mod backend;
pub mod error;
pub mod keys;
pub mod manager;
pub mod memory;
pub mod record;
pub mod redis;
pub mod store;

pub use backend::SessionBackend;
pub use error::SessionError;
pub use manager::SessionManager;
pub use memory::MemoryBackend;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::UnavailableBackend;
pub use record::{SessionId, SessionRecord};
pub use crate::redis::RedisBackend;
pub use store::{SessionStore, signing_key};
