//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for store values and backup payloads.
//! Each encryption operation generates a unique nonce.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, TallyResult};

use super::DerivedKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encrypted data with associated metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The nonce used for this encryption (base64 encoded)
    pub nonce: String,
    /// The encrypted ciphertext with authentication tag (base64 encoded)
    pub ciphertext: String,
    /// Version for future algorithm upgrades
    #[serde(default = "default_version")]
    pub version: u8,
}

fn default_version() -> u8 {
    1
}

impl EncryptedData {
    fn new(nonce: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
            version: 1,
        }
    }

    fn decode_nonce(&self) -> TallyResult<Vec<u8>> {
        STANDARD
            .decode(&self.nonce)
            .map_err(|e| TallyError::Encryption(format!("Invalid nonce encoding: {}", e)))
    }

    fn decode_ciphertext(&self) -> TallyResult<Vec<u8>> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| TallyError::Encryption(format!("Invalid ciphertext encoding: {}", e)))
    }
}

fn cipher_for(key: &DerivedKey) -> TallyResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))
}

fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    nonce_bytes
}

/// Encrypt plaintext data using AES-256-GCM
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> TallyResult<EncryptedData> {
    let cipher = cipher_for(key)?;
    let nonce_bytes = random_nonce();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| TallyError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedData::new(&nonce_bytes, &ciphertext))
}

/// Decrypt ciphertext using AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &DerivedKey) -> TallyResult<Vec<u8>> {
    if encrypted.version != 1 {
        return Err(TallyError::Encryption(format!(
            "Unsupported encryption version: {}",
            encrypted.version
        )));
    }

    let nonce_bytes = encrypted.decode_nonce()?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(TallyError::Encryption(format!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }

    let ciphertext = encrypted.decode_ciphertext()?;
    cipher_for(key)?
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| {
            TallyError::Encryption("Decryption failed: invalid key or corrupted data".to_string())
        })
}

/// Encrypt a string
pub fn encrypt_string(plaintext: &str, key: &DerivedKey) -> TallyResult<EncryptedData> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt to a string
pub fn decrypt_string(encrypted: &EncryptedData, key: &DerivedKey) -> TallyResult<String> {
    let plaintext = decrypt(encrypted, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| TallyError::Encryption(format!("Invalid UTF-8 in decrypted data: {}", e)))
}

/// Encrypt into a single buffer laid out as `nonce || ciphertext`
pub fn seal_bytes(plaintext: &[u8], key: &DerivedKey) -> TallyResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce_bytes = random_nonce();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| TallyError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse of [`seal_bytes`]
pub fn open_bytes(sealed: &[u8], key: &DerivedKey) -> TallyResult<Vec<u8>> {
    if sealed.len() <= NONCE_SIZE {
        return Err(TallyError::Encryption("Sealed data is truncated".to_string()));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

    cipher_for(key)?
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            TallyError::Encryption("Decryption failed: invalid key or corrupted data".to_string())
        })
}
