//! # Lectern Core
//!
//! Foundational types shared by every Lectern crate:
//!
//! - [`errors`]: [`AppError`], the HTTP-facing error type
//! - [`password`]: bcrypt hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use lectern_core::{AppError, hash_password, verify_password};
//!
//! let hash = hash_password("secure_password")?;
//! assert!(verify_password("secure_password", &hash)?);
//! ```

pub mod errors;
pub mod password;

pub use errors::AppError;
pub use password::{dummy_hash, hash_password, verify_password};
