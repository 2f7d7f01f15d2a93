//! # Lectern Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`session`]: session cookie and session store settings
//! - [`rate_limit`]: request admission settings
//! - [`cors`]: CORS settings
//!
//! # Example
//!
//! ```ignore
//! use lectern_config::{CorsConfig, RateLimitConfig, SessionConfig, SessionStoreConfig};
//!
//! let session = SessionConfig::from_env()?;
//! let store = SessionStoreConfig::from_env()?;
//! let rate_limit = RateLimitConfig::from_env();
//! let cors = CorsConfig::from_env();
//! ```

pub mod cors;
pub mod error;
pub mod rate_limit;
pub mod session;

pub use cors::CorsConfig;
pub use error::ConfigError;
pub use rate_limit::{RateLimitConfig, RateLimitMode};
pub use session::{SessionBackendKind, SessionConfig, SessionStoreConfig};
