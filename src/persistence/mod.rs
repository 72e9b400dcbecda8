//! Best-effort durable storage
//!
//! Two records live in a string key-value store: the run snapshot and the
//! player identity. Every failure surfaces as a `StorageError` to the caller,
//! which logs it and carries on with in-memory state.

pub mod cookie;
pub mod snapshot;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::highscores::sanitize_name;

pub use snapshot::{PersistedAlien, Snapshot};

/// Run snapshot key
pub const SNAPSHOT_KEY: &str = "vv-invaders";
/// Player identity key (storage and cookie)
pub const IDENTITY_KEY: &str = "vv-invaders-player";

/// String key-value store (localStorage, cookies, memory)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and native builds
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    /// Reject every write (quota exceeded, private mode)
    pub read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Write {
                key: key.to_string(),
            });
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store that has no backing at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StorageError::Deserialize {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

pub fn write_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Serialize(e.to_string()))?;
    store.set(key, &json)
}

/// Who is playing: saved name and the server-issued token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Identity {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.token.is_none()
    }

    /// Drop anything that would not survive name entry
    fn sanitized(mut self) -> Self {
        self.name = self.name.as_deref().and_then(sanitize_name);
        self.token = self.token.filter(|t| !t.is_empty());
        self
    }
}

/// Identity from the primary store, falling back to the cookie store
pub fn load_identity(primary: &dyn KeyValueStore, fallback: &dyn KeyValueStore) -> Identity {
    fn from(store: &dyn KeyValueStore, label: &str) -> Option<Identity> {
        match read_json::<Identity>(store, IDENTITY_KEY) {
            Ok(found) => found,
            Err(err) => {
                log::debug!("Identity unavailable from {label}: {err}");
                None
            }
        }
    }
    let identity = from(primary, "storage")
        .filter(|id| !id.is_empty())
        .or_else(|| from(fallback, "cookie"))
        .unwrap_or_default()
        .sanitized();
    if let Some(name) = &identity.name {
        log::info!("Welcome back, {name}");
    }
    identity
}

/// Write the identity everywhere it can go. Succeeds if any store took it.
pub fn save_identity(
    primary: &mut dyn KeyValueStore,
    fallback: &mut dyn KeyValueStore,
    identity: &Identity,
) -> Result<(), StorageError> {
    let first = write_json(primary, IDENTITY_KEY, identity);
    let second = write_json(fallback, IDENTITY_KEY, identity);
    match (first, second) {
        (Err(err), Err(_)) => Err(err),
        (Err(err), Ok(())) | (Ok(()), Err(err)) => {
            log::debug!("Identity saved with one store failing: {err}");
            Ok(())
        }
        (Ok(()), Ok(())) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_reports_bad_values() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        let err = read_json::<Identity>(&store, "k").unwrap_err();
        assert!(matches!(err, StorageError::Deserialize { .. }));
        assert_eq!(read_json::<Identity>(&store, "missing"), Ok(None));
    }

    #[test]
    fn test_identity_falls_back_to_cookie() {
        let primary = MemoryStore::new();
        let mut cookie = MemoryStore::new();
        cookie
            .set(IDENTITY_KEY, r#"{"name":"ace","token":"t-1"}"#)
            .unwrap();
        let id = load_identity(&primary, &cookie);
        assert_eq!(id.name.as_deref(), Some("ACE"));
        assert_eq!(id.token.as_deref(), Some("t-1"));

        assert_eq!(load_identity(&NullStore, &NullStore), Identity::default());
    }

    #[test]
    fn test_save_identity_survives_one_failure() {
        let mut primary = MemoryStore {
            read_only: true,
            ..Default::default()
        };
        let mut cookie = MemoryStore::new();
        let id = Identity {
            name: Some("ACE".into()),
            token: None,
        };
        assert!(save_identity(&mut primary, &mut cookie, &id).is_ok());
        assert_eq!(load_identity(&primary, &cookie), id);
        assert!(save_identity(&mut primary, &mut NullStore, &id).is_err());
    }
}
