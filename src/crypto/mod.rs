//! Cryptographic functions for Tally
//!
//! Provides AES-256-GCM encryption with Argon2id key derivation for the
//! encrypted-at-rest store, and the sealed, HMAC-signed envelope used for
//! portable backups.

pub mod encryption;
pub mod envelope;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, decrypt_string, encrypt, encrypt_string, EncryptedData};
pub use envelope::{
    open, require_passphrase, seal, SealedPayload, CURRENT_BACKUP_VERSION, MIN_PASSPHRASE_LEN,
};
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use secure_memory::SecureString;
