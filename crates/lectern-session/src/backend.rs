//! Storage seam for session records.
//!
//! Backends move opaque strings under string keys with an expiry. Encoding
//! and cookie handling live in [`crate::store`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionError;

#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// Reads a value. Expired keys read as `None`.
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Writes a value, replacing any previous one and resetting its expiry.
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Writes a value only if the key is free. Returns whether it was written.
    async fn store_new(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, SessionError>;

    /// Deletes a key. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}
