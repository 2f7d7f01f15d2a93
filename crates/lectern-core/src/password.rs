//! Password hashing and verification.
//!
//! Hashes are produced with bcrypt at [`DEFAULT_COST`]. Callers treat the
//! hash as opaque; the only question ever asked of it is "does this
//! plaintext match".

use std::sync::OnceLock;

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("Failed to verify password: {}", e)))
}

/// Hash of a throwaway password at the same cost as real hashes.
///
/// Verifying against it makes a lookup miss cost the same as a mismatch.
pub fn dummy_hash() -> Result<&'static str, AppError> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }
    let computed = hash_password("lectern-placeholder-password")?;
    Ok(DUMMY_HASH.get_or_init(|| computed))
}
