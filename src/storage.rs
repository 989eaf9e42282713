//! Local key-value persistence.
//!
//! Each manager stores its whole state as one JSON blob under a fixed key.

use crate::error::{DoorknockError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key holding the signed-in user profile
pub const USER_PROFILE_KEY: &str = "user_profile";
/// Key holding the activity ledger
pub const ACTIVITY_RECORDS_KEY: &str = "activity_records";

/// Byte-oriented key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Store backed by an on-disk sled database
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        debug!(path = %path.display(), "Opened key-value store");
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-process store, for tests and for embedders with their own persistence
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| DoorknockError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Decode the JSON blob under `key`.
///
/// A missing key, an unreadable store and an undecodable blob all yield
/// `None`; the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read stored blob");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding undecodable stored blob");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes)
}
