//! Durable key/value storage
//!
//! Everything the quest remembers between page loads goes through
//! `KeyValueStore`: the progress record, personal bests and settings. Missing
//! keys are never errors, they simply mean "use the default". Write failures are
//! reported to the caller, which logs them and carries on in memory.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[cfg(target_arch = "wasm32")]
mod local;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

/// Storage keys
pub mod keys {
    pub const PROGRESS: &str = "gift_escape_progress";
    pub const SETTINGS: &str = "gift_escape_settings";
    pub const SNAKE_HIGH_SCORE: &str = "gift_escape_snake_high_score";
    pub const CATCHER_HIGH_SCORE: &str = "gift_escape_catcher_high_score";
    pub const MEMORY_BEST_TIME: &str = "gift_escape_memory_best_time";
    pub const PUZZLE_BEST_MOVES: &str = "gift_escape_puzzle_best_moves";
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("stored value under {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// String key/value store (LocalStorage on web, a map natively)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Read and decode a JSON value; `Ok(None)` when the key is absent
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encode and write a JSON value
pub fn save_json<T: Serialize>(store: &mut impl KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &json)
}

/// In-memory store used natively and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Simulate a full or revoked storage: every write fails
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (quota exceeded, private mode, ...)
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.reject_writes {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.reject_writes {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        let value: Option<u32> = load_json(&store, "nope").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "k", &vec![1, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = load_json(&store, "k").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_value_reports_key() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        let err = load_json::<u32>(&store, "k").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "k"));
    }

    #[test]
    fn test_rejected_writes_leave_old_value() {
        let mut store = MemoryStore::new();
        store.set("k", "1").unwrap();
        store.set_reject_writes(true);
        assert!(store.set("k", "2").is_err());
        assert!(store.remove("k").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1"));
    }
}
