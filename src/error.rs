//! Custom error types for Tally
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. The backup-specific variants form the
//! taxonomy reported by the restore path.

use thiserror::Error;

/// The main error type for Tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Encryption errors (at-rest store, cipher setup)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backup passphrase shorter than the accepted minimum
    #[error("Passphrase must be at least {min} characters long")]
    PassphraseTooShort { min: usize },

    /// Backup envelope is structurally invalid
    #[error("Invalid backup format: {0}")]
    InvalidEnvelopeFormat(String),

    /// Backup was written by a newer schema
    #[error("Backup version {found} is newer than the supported version {supported}")]
    VersionTooNew { found: i64, supported: u32 },

    /// Integrity tag does not match the sealed data
    #[error("Backup signature mismatch: wrong passphrase or the file was modified")]
    SignatureMismatch,

    /// Signature matched but the payload could not be decrypted
    #[error("Invalid passphrase or corrupted backup data")]
    InvalidPassphraseOrCorrupted,
}

impl TallyError {
    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Tally operations
pub type TallyResult<T> = Result<T, TallyError>;
