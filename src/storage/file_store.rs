//! Directory-backed key-value store
//!
//! Each key is one file, `<dir>/<key>.json`, written atomically.

use std::path::PathBuf;

use tracing::debug;

use crate::error::TallyResult;

use super::file_io::{read_optional, remove_if_exists, write_atomic};
use super::kv::{validate_key, KeyValueStore};

/// Plain on-disk store
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> TallyResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> TallyResult<Option<String>> {
        read_optional(self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> TallyResult<()> {
        debug!(key, bytes = value.len(), "store write");
        write_atomic(self.path_for(key)?, value)
    }

    fn remove(&self, key: &str) -> TallyResult<()> {
        debug!(key, "store remove");
        remove_if_exists(self.path_for(key)?)
    }
}
