//! Opening storage for one CLI invocation

use tracing::debug;

use crate::config::{Settings, TallyPaths};
use crate::error::TallyResult;
use crate::storage::{unlock_secure_store, FileStore, Storage};

use super::passphrase::{from_env, read_passphrase, STORE_PASSPHRASE_ENV};

/// When to unlock the secure store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unlock {
    /// Leave it locked
    Never,
    /// Unlock if a passphrase is in the environment or one was set up before
    IfAvailable,
    /// Always unlock, prompting if needed
    Required,
}

/// Open plain and secure stores for a command
pub fn open_storage(
    paths: &TallyPaths,
    settings: &mut Settings,
    unlock: Unlock,
) -> TallyResult<Storage> {
    let wanted = match unlock {
        Unlock::Never => false,
        Unlock::IfAvailable => {
            from_env(STORE_PASSPHRASE_ENV).is_some() || settings.secure_store.is_configured()
        }
        Unlock::Required => true,
    };

    if !wanted {
        debug!("secure store left locked");
        return Storage::open(paths, None);
    }

    paths.ensure_directories()?;
    let passphrase = read_passphrase(STORE_PASSPHRASE_ENV, "Passphrase: ")?;
    let secure = unlock_secure_store(paths, settings, &passphrase)?;
    Ok(Storage::new(FileStore::new(paths.data_dir()), secure))
}
