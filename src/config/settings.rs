//! User settings for Tally
//!
//! Manages user preferences, the backup file naming prefix, and the key
//! derivation state of the encrypted-at-rest store.

use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::TallyError;

/// Key material bookkeeping for the encrypted-at-rest store
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecureStoreSettings {
    /// Key derivation parameters (salt, memory cost, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_params: Option<KeyDerivationParams>,

    /// Known plaintext sealed under the derived key, used to check the passphrase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_hash: Option<String>,
}

impl SecureStoreSettings {
    /// Whether the secure store has been set up with a passphrase
    pub fn is_configured(&self) -> bool {
        self.key_params.is_some() && self.verification_hash.is_some()
    }
}

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Application name used as the backup file prefix
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Encrypted store settings
    #[serde(default)]
    pub secure_store: SecureStoreSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_app_name() -> String {
    "Tally".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            app_name: default_app_name(),
            secure_store: SecureStoreSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| TallyError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TallyError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TallyError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
