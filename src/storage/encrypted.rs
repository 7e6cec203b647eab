//! Encrypted-at-rest store wrappers
//!
//! [`EncryptedStore`] seals every value with AES-256-GCM before handing it to
//! the inner store. [`LockedStore`] stands in for the secure store when no
//! passphrase was supplied.

use crate::crypto::{decrypt_string, encrypt_string, DerivedKey, EncryptedData};
use crate::error::{TallyError, TallyResult};

use super::kv::KeyValueStore;

/// Store wrapper that encrypts values with a derived key
pub struct EncryptedStore<S> {
    inner: S,
    key: DerivedKey,
}

impl<S: KeyValueStore> EncryptedStore<S> {
    pub fn new(inner: S, key: DerivedKey) -> Self {
        Self { inner, key }
    }
}

impl<S: KeyValueStore> KeyValueStore for EncryptedStore<S> {
    fn get(&self, key: &str) -> TallyResult<Option<String>> {
        let Some(raw) = self.inner.get(key)? else {
            return Ok(None);
        };
        let sealed: EncryptedData = serde_json::from_str(&raw).map_err(|e| {
            TallyError::Encryption(format!("Corrupt encrypted value for '{}': {}", key, e))
        })?;
        decrypt_string(&sealed, &self.key).map(Some)
    }

    fn set(&self, key: &str, value: &str) -> TallyResult<()> {
        let sealed = encrypt_string(value, &self.key)?;
        let raw = serde_json::to_string(&sealed)?;
        self.inner.set(key, &raw)
    }

    fn remove(&self, key: &str) -> TallyResult<()> {
        self.inner.remove(key)
    }
}

/// Secure store placeholder that refuses every access
#[derive(Debug, Default)]
pub struct LockedStore;

impl LockedStore {
    fn locked<T>() -> TallyResult<T> {
        Err(TallyError::Encryption(
            "Secure store is locked (no passphrase supplied)".to_string(),
        ))
    }
}

impl KeyValueStore for LockedStore {
    fn get(&self, _key: &str) -> TallyResult<Option<String>> {
        Self::locked()
    }

    fn set(&self, _key: &str, _value: &str) -> TallyResult<()> {
        Self::locked()
    }

    fn remove(&self, _key: &str) -> TallyResult<()> {
        Self::locked()
    }
}
