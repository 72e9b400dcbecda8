//! Error types for the two fallible boundaries: durable storage and the
//! highscore endpoint.
//!
//! Neither is ever fatal. Callers log and fall back (fresh state, skipped
//! write, empty or last-known leaderboard).

use std::fmt;

/// Durable key-value store failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No backing store (private mode, storage disabled, native build)
    Unavailable,
    /// The store refused a read
    Read {
        key: String,
    },
    /// The store refused a write (quota, security policy)
    Write {
        key: String,
    },
    /// Value could not be encoded
    Serialize(String),
    /// Stored value was not valid for its type
    Deserialize {
        key: String,
        reason: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "storage unavailable"),
            StorageError::Read { key } => write!(f, "failed to read '{key}'"),
            StorageError::Write { key } => write!(f, "failed to write '{key}'"),
            StorageError::Serialize(reason) => write!(f, "failed to encode value: {reason}"),
            StorageError::Deserialize { key, reason } => {
                write!(f, "stored value for '{key}' is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Highscore endpoint failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Request could not be built or sent
    Request(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Body was not the expected JSON shape
    Malformed(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Request(reason) => write!(f, "request failed: {reason}"),
            NetworkError::Status(code) => write!(f, "server returned status {code}"),
            NetworkError::Malformed(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

impl std::error::Error for NetworkError {}
