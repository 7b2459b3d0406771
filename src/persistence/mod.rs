pub mod files;
pub mod kv;

pub use files::{atomic_write, ensure_dir, get_data_dir, init_local_data_dir, read_file, FileStore, DATA_DIR_NAME};
pub use kv::{validate_key, KeyValueStore, MemoryStore, PersistenceError, FAMILY_MEMBERS_KEY, TASKS_KEY};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and decode a JSON list stored under `key`; `Ok(None)` if absent
pub fn load_list<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<Vec<T>>, PersistenceError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `items` as JSON and store the whole list under `key`
pub fn save_list<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(items)?;
    store.set(key, &json)
}
