//! Storage initialization
//!
//! First-run setup: starter accounts and categories.

use tracing::info;

use crate::error::TallyError;

use super::{keys, set_json, Storage};

const DEFAULT_ACCOUNTS: &[&str] = &["Cash", "Bank"];

const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Housing",
    "Utilities",
    "Entertainment",
    "Health",
    "Shopping",
];

const DEFAULT_INCOME_CATEGORIES: &[&str] = &["Salary", "Freelance", "Gifts"];

/// Create starter lists that don't exist yet
///
/// Returns the keys that were written. Existing lists are never touched.
pub fn initialize_storage(storage: &Storage) -> Result<Vec<&'static str>, TallyError> {
    let mut created = Vec::new();

    for (key, defaults) in [
        (keys::ACCOUNTS, DEFAULT_ACCOUNTS),
        (keys::EXPENSE_CATEGORIES, DEFAULT_EXPENSE_CATEGORIES),
        (keys::INCOME_CATEGORIES, DEFAULT_INCOME_CATEGORIES),
    ] {
        if storage.plain().get(key)?.is_none() {
            set_json(storage.plain(), key, defaults)?;
            created.push(key);
        }
    }

    if !created.is_empty() {
        info!(lists = ?created, "created starter lists");
    }
    Ok(created)
}
