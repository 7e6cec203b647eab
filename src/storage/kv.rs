//! Key-value store abstraction
//!
//! Stores deal in strings only. Structured values are JSON-encoded by the
//! caller, through [`get_json`] and [`set_json`].

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{TallyError, TallyResult};

/// A single-key-at-a-time string store
///
/// There is no multi-key transaction primitive; every call stands alone.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> TallyResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> TallyResult<()>;

    /// Delete a key; deleting an absent key is not an error
    fn remove(&self, key: &str) -> TallyResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> TallyResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> TallyResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> TallyResult<()> {
        (**self).remove(key)
    }
}

/// Read and decode a JSON value
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> TallyResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| TallyError::Json(format!("Failed to parse '{}': {}", key, e))),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> TallyResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| TallyError::Json(format!("Failed to serialize '{}': {}", key, e)))?;
    store.set(key, &raw)
}

/// Keys are used as file names, so only a conservative alphabet is allowed
pub(crate) fn validate_key(key: &str) -> TallyResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TallyError::Storage(format!("Invalid store key: '{}'", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        set_json(&store, "accounts", &vec!["Cash", "Bank"]).unwrap();

        let accounts: Option<Vec<String>> = get_json(&store, "accounts").unwrap();
        assert_eq!(accounts, Some(vec!["Cash".to_string(), "Bank".to_string()]));

        let missing: Option<Vec<String>> = get_json(&store, "goals").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_get_json_reports_corrupt_value() {
        let store = MemoryStore::new();
        store.set("accounts", "{not json").unwrap();

        let result: TallyResult<Option<Vec<String>>> = get_json(&store, "accounts");
        assert!(matches!(result, Err(TallyError::Json(_))));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("expenseCategories").is_ok());
        assert!(validate_key("theme_mode-2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
    }
}
