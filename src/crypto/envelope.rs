//! Backup envelope sealing
//!
//! Encrypt-then-MAC over a versioned JSON envelope:
//!
//! - the payload is encrypted with AES-256-GCM; `sealedData` is
//!   `base64(nonce || ciphertext)`
//! - `signature` is the lowercase hex HMAC-SHA256 of the `sealedData` string,
//!   keyed with the passphrase bytes
//!
//! The cipher key is the SHA-256 digest of the passphrase. There is no salt
//! and no key stretching; a backup is exactly as strong as its passphrase.
//! Changing that requires a new envelope version.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{TallyError, TallyResult};
use crate::models::EncryptedBackup;

use super::encryption::{open_bytes, seal_bytes};
use super::DerivedKey;

/// Newest envelope version this build can open
pub const CURRENT_BACKUP_VERSION: u32 = 1;

/// Minimum backup passphrase length, in characters
pub const MIN_PASSPHRASE_LEN: usize = 8;

type HmacSha256 = Hmac<Sha256>;

/// Ciphertext and integrity tag produced by [`seal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub sealed_data: String,
    pub signature: String,
}

/// Reject passphrases shorter than [`MIN_PASSPHRASE_LEN`]
pub fn require_passphrase(passphrase: &str) -> TallyResult<()> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(TallyError::PassphraseTooShort {
            min: MIN_PASSPHRASE_LEN,
        });
    }
    Ok(())
}

fn passphrase_key(passphrase: &str) -> DerivedKey {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    DerivedKey::from_bytes(key)
}

fn mac_for(passphrase: &str, sealed_data: &str) -> TallyResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(passphrase.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("HMAC error: {}", e)))?;
    mac.update(sealed_data.as_bytes());
    Ok(mac)
}

/// Compute the envelope signature for `sealed_data`
pub fn sign(sealed_data: &str, passphrase: &str) -> TallyResult<String> {
    let mac = mac_for(passphrase, sealed_data)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Encrypt `payload_json` and sign the result
pub fn seal(payload_json: &str, passphrase: &str) -> TallyResult<SealedPayload> {
    require_passphrase(passphrase)?;

    let key = passphrase_key(passphrase);
    let sealed = seal_bytes(payload_json.as_bytes(), &key)?;
    let sealed_data = STANDARD.encode(sealed);
    let signature = sign(&sealed_data, passphrase)?;

    debug!(bytes = payload_json.len(), "sealed backup payload");
    Ok(SealedPayload {
        sealed_data,
        signature,
    })
}

/// Verify and decrypt an envelope, returning the plaintext payload
///
/// The version gate runs before any cryptographic work, and nothing is
/// decrypted unless the signature matches.
pub fn open(envelope: &EncryptedBackup, passphrase: &str) -> TallyResult<String> {
    require_passphrase(passphrase)?;
    check_version(envelope.version)?;

    let expected = decode_signature(&envelope.signature)?;
    mac_for(passphrase, &envelope.sealed_data)?
        .verify_slice(&expected)
        .map_err(|_| TallyError::SignatureMismatch)?;

    let sealed = STANDARD
        .decode(&envelope.sealed_data)
        .map_err(|_| TallyError::InvalidPassphraseOrCorrupted)?;
    let plaintext = open_bytes(&sealed, &passphrase_key(passphrase))
        .map_err(|_| TallyError::InvalidPassphraseOrCorrupted)?;
    let plaintext =
        String::from_utf8(plaintext).map_err(|_| TallyError::InvalidPassphraseOrCorrupted)?;

    if plaintext.is_empty() {
        return Err(TallyError::InvalidPassphraseOrCorrupted);
    }
    Ok(plaintext)
}

/// Fail with `VersionTooNew` for envelopes from a newer schema
pub fn check_version(version: i64) -> TallyResult<()> {
    if version > i64::from(CURRENT_BACKUP_VERSION) {
        return Err(TallyError::VersionTooNew {
            found: version,
            supported: CURRENT_BACKUP_VERSION,
        });
    }
    Ok(())
}

// Only the canonical lowercase form is accepted, so any edit to the stored
// string is a mismatch.
fn decode_signature(signature: &str) -> TallyResult<Vec<u8>> {
    if signature
        .bytes()
        .any(|b| !(b.is_ascii_digit() || (b'a'..=b'f').contains(&b)))
    {
        return Err(TallyError::SignatureMismatch);
    }
    hex::decode(signature).map_err(|_| TallyError::SignatureMismatch)
}
