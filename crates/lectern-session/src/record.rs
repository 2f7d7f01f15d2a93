//! Session identifiers and records.

use std::collections::HashMap;
use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ID_BYTES: usize = 32;

/// Opaque session identifier: 32 random bytes, hex encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Draws a fresh identifier from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accepts only values shaped like ids this crate generates.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == ID_BYTES * 2
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to correlate log lines, not enough to replay the cookie.
        write!(f, "SessionId({}..)", &self.0[..8])
    }
}

/// A session as held by the store: an id plus a small map of named values.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: SessionId,
    values: HashMap<String, Value>,
}

/// Stored body of a record. The id is the key, so it is not repeated.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoredValues {
    #[serde(default)]
    pub values: HashMap<String, Value>,
}

impl SessionRecord {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            values: HashMap::new(),
        }
    }

    pub(crate) fn from_stored(id: SessionId, stored: StoredValues) -> Self {
        Self {
            id,
            values: stored.values,
        }
    }

    pub(crate) fn to_stored(&self) -> StoredValues {
        StoredValues {
            values: self.values.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
