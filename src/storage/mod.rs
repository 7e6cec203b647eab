//! Storage layer for Tally
//!
//! Two key-value stores back the application: a plain one for the ledger,
//! lists, and summaries, and an encrypted-at-rest one for profile fields.
//! [`Storage`] owns both handles; it is created by the caller at session
//! start and passed by reference to everything that needs it.

pub mod encrypted;
pub mod file_io;
pub mod file_store;
pub mod init;
pub mod kv;
pub mod memory;
pub mod secure;

pub use encrypted::{EncryptedStore, LockedStore};
pub use file_store::FileStore;
pub use init::initialize_storage;
pub use kv::{get_json, set_json, KeyValueStore};
pub use memory::MemoryStore;
pub use secure::unlock_secure_store;

use crate::config::TallyPaths;
use crate::crypto::DerivedKey;
use crate::error::TallyError;

/// Well-known store keys
pub mod keys {
    pub const TRANSACTIONS: &str = "transactions";
    pub const GOALS: &str = "goals";
    pub const ACCOUNTS: &str = "accounts";
    pub const EXPENSE_CATEGORIES: &str = "expenseCategories";
    pub const INCOME_CATEGORIES: &str = "incomeCategories";
    pub const SELECTED_CURRENCY: &str = "selectedCurrency";
    pub const SUMMARIES: &str = "summaries";

    // Encrypted store
    pub const THEME_MODE: &str = "themeMode";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const PROFILE_PICTURE: &str = "profilePicture";
}

/// Plain and secure store handles for one session
pub struct Storage {
    plain: Box<dyn KeyValueStore>,
    secure: Box<dyn KeyValueStore>,
}

impl Storage {
    /// Assemble storage from explicit store handles
    pub fn new(plain: impl KeyValueStore + 'static, secure: impl KeyValueStore + 'static) -> Self {
        Self {
            plain: Box::new(plain),
            secure: Box::new(secure),
        }
    }

    /// Open the on-disk stores; without a key the secure store stays locked
    pub fn open(paths: &TallyPaths, secure_key: Option<DerivedKey>) -> Result<Self, TallyError> {
        paths.ensure_directories()?;

        let plain = FileStore::new(paths.data_dir());
        Ok(match secure_key {
            Some(key) => Self::new(
                plain,
                EncryptedStore::new(FileStore::new(paths.secure_dir()), key),
            ),
            None => Self::new(plain, LockedStore),
        })
    }

    /// Volatile storage for tests and dry runs
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), MemoryStore::new())
    }

    /// The plain store
    pub fn plain(&self) -> &dyn KeyValueStore {
        self.plain.as_ref()
    }

    /// The encrypted-at-rest store
    pub fn secure(&self) -> &dyn KeyValueStore {
        self.secure.as_ref()
    }
}
