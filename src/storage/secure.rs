//! Unlocking the encrypted-at-rest store
//!
//! The first unlock generates Argon2id parameters and seals a known
//! plaintext under the derived key; later unlocks derive the key again and
//! check it against that blob.

use tracing::info;

use crate::config::{SecureStoreSettings, Settings, TallyPaths};
use crate::crypto::{
    decrypt_string, derive_key, encrypt_string, require_passphrase, DerivedKey, EncryptedData,
    KeyDerivationParams,
};
use crate::error::{TallyError, TallyResult};

use super::encrypted::EncryptedStore;
use super::file_store::FileStore;

const VERIFY_PLAINTEXT: &str = "tally_verify";

/// Derive the store key, initializing the key parameters on first use
///
/// Returns the key and whether `settings` were modified.
pub fn unlock_key(
    settings: &mut SecureStoreSettings,
    passphrase: &str,
) -> TallyResult<(DerivedKey, bool)> {
    match (&settings.key_params, &settings.verification_hash) {
        (Some(params), Some(verification)) => {
            let key = derive_key(passphrase, params)?;
            verify_key(&key, verification)?;
            Ok((key, false))
        }
        _ => {
            require_passphrase(passphrase)?;
            let params = KeyDerivationParams::generate();
            let key = initialize(settings, passphrase, params)?;
            Ok((key, true))
        }
    }
}

fn initialize(
    settings: &mut SecureStoreSettings,
    passphrase: &str,
    params: KeyDerivationParams,
) -> TallyResult<DerivedKey> {
    let key = derive_key(passphrase, &params)?;
    let verification = encrypt_string(VERIFY_PLAINTEXT, &key)?;
    let verification_json = serde_json::to_string(&verification).map_err(|e| {
        TallyError::Encryption(format!("Failed to serialize verification: {}", e))
    })?;

    settings.key_params = Some(params);
    settings.verification_hash = Some(verification_json);
    Ok(key)
}

fn verify_key(key: &DerivedKey, verification: &str) -> TallyResult<()> {
    let sealed: EncryptedData = serde_json::from_str(verification).map_err(|e| {
        TallyError::Encryption(format!("Corrupt verification data: {}", e))
    })?;

    match decrypt_string(&sealed, key) {
        Ok(text) if text == VERIFY_PLAINTEXT => Ok(()),
        _ => Err(TallyError::Encryption("Incorrect passphrase".to_string())),
    }
}

/// Open the on-disk secure store, saving settings if this was the first unlock
pub fn unlock_secure_store(
    paths: &TallyPaths,
    settings: &mut Settings,
    passphrase: &str,
) -> TallyResult<EncryptedStore<FileStore>> {
    let (key, created) = unlock_key(&mut settings.secure_store, passphrase)?;
    if created {
        settings.save(paths)?;
        info!("initialized encrypted store");
    }
    Ok(EncryptedStore::new(FileStore::new(paths.secure_dir()), key))
}
