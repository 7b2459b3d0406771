use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Key holding the JSON array of tasks
pub const TASKS_KEY: &str = "tasks";
/// Key holding the JSON array of family members
pub const FAMILY_MEMBERS_KEY: &str = "family_members";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("storage backend failed for key {key}: {reason}")]
    Backend { key: String, reason: String },
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal key-value capability the stores persist through
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Keys are used as file names, so they stay in `[a-z0-9_-]`
pub fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        validate_key(key)?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key(TASKS_KEY).is_ok());
        assert!(validate_key(FAMILY_MEMBERS_KEY).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc").is_err());
        assert!(validate_key("@qplanning_tasks").is_err());
    }

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(TASKS_KEY).unwrap(), None);

        store.set(TASKS_KEY, "[]").unwrap();
        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_rejects_bad_key() {
        let store = MemoryStore::new();
        assert!(matches!(store.set("a/b", "x"), Err(PersistenceError::InvalidKey(_))));
    }
}
