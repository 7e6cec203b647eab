//! Argon2id key derivation for the at-rest store
//!
//! Backup envelopes do not go through this path (see `crypto::envelope`).

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{TallyError, TallyResult};

const KEY_LEN: usize = 32;

/// Argon2id settings stored alongside the secure store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Base64 salt, generated once per store
    pub salt: String,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
}

impl KeyDerivationParams {
    /// Fresh params with a random salt and the default costs (64 MiB, 3 passes)
    pub fn generate() -> Self {
        Self::with_values(SaltString::generate(&mut OsRng).to_string(), 65536, 3, 4)
    }

    /// Params with explicit values
    pub fn with_values(salt: String, memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            salt,
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    fn argon2(&self) -> TallyResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| TallyError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// A 256-bit symmetric key, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

/// Derive the store key from a passphrase
pub fn derive_key(passphrase: &str, params: &KeyDerivationParams) -> TallyResult<DerivedKey> {
    let salt = SaltString::from_b64(&params.salt)
        .map_err(|e| TallyError::Encryption(format!("Invalid salt: {}", e)))?;

    let mut key = DerivedKey::from_bytes([0u8; KEY_LEN]);
    params
        .argon2()?
        .hash_password_into(passphrase.as_bytes(), salt.as_str().as_bytes(), &mut key.key)
        .map_err(|e| TallyError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}

#[cfg(test)]
pub(crate) fn fast_params() -> KeyDerivationParams {
    KeyDerivationParams::with_values(SaltString::generate(&mut OsRng).to_string(), 1024, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic_per_salt() {
        let params = fast_params();
        let key1 = derive_key("test_passphrase", &params).unwrap();
        let key2 = derive_key("test_passphrase", &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let other = derive_key("other_passphrase", &params).unwrap();
        assert_ne!(key1.as_bytes(), other.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same_passphrase", &fast_params()).unwrap();
        let key2 = derive_key("same_passphrase", &fast_params()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_generated_params_round_trip_through_json() {
        let params = KeyDerivationParams::generate();
        assert!(!params.salt.is_empty());
        assert_eq!(params.memory_cost, 65536);

        let json = serde_json::to_string(&params).unwrap();
        let back: KeyDerivationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_invalid_salt_rejected() {
        let params = KeyDerivationParams::with_values("!!".to_string(), 1024, 1, 1);
        assert!(matches!(
            derive_key("test_passphrase", &params),
            Err(TallyError::Encryption(_))
        ));
    }

    #[test]
    fn test_invalid_costs_rejected() {
        let mut params = fast_params();
        params.time_cost = 0;
        assert!(derive_key("test_passphrase", &params).is_err());
    }
}
