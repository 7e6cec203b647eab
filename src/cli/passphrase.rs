//! Passphrase input
//!
//! Environment variables win so scripts can run unattended; otherwise the
//! user is prompted without echo.

use crate::crypto::{SecureString, MIN_PASSPHRASE_LEN};
use crate::error::{TallyError, TallyResult};

/// Passphrase for the encrypted-at-rest store
pub const STORE_PASSPHRASE_ENV: &str = "TALLY_PASSPHRASE";

/// Passphrase for backup files
pub const BACKUP_PASSPHRASE_ENV: &str = "TALLY_BACKUP_PASSPHRASE";

/// Read a passphrase from `env_var` if set
pub fn from_env(env_var: &str) -> Option<SecureString> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecureString::new)
}

/// Read a passphrase from `env_var`, or prompt once
pub fn read_passphrase(env_var: &str, prompt: &str) -> TallyResult<SecureString> {
    match from_env(env_var) {
        Some(passphrase) => Ok(passphrase),
        None => prompt_passphrase(prompt),
    }
}

/// Read a passphrase from `env_var`, or prompt twice and compare
pub fn read_new_passphrase(env_var: &str) -> TallyResult<SecureString> {
    if let Some(passphrase) = from_env(env_var) {
        return Ok(passphrase);
    }

    loop {
        let first = prompt_passphrase("Enter new passphrase: ")?;
        if first.char_len() < MIN_PASSPHRASE_LEN {
            println!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let second = prompt_passphrase("Confirm passphrase: ")?;
        if first.as_str() != second.as_str() {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

fn prompt_passphrase(prompt: &str) -> TallyResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| TallyError::Encryption(format!("Failed to read passphrase: {}", e)))
}
