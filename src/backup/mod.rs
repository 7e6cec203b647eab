//! Encrypted backup and restore for Tally
//!
//! # Architecture
//!
//! - `codec`: gathers local state into a [`BackupPayload`] and re-validates
//!   payloads read back from untrusted files
//! - `restore`: the import pipeline, from raw envelope JSON to persisted
//!   stores and rebuilt summaries
//! - `manager`: backup files on disk
//!
//! Sealing and opening the envelope itself is [`crate::crypto::envelope`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::backup::{BackupManager, ImportOptions, RestoreCoordinator};
//!
//! let manager = BackupManager::new(paths, settings);
//! let path = manager.export_to_file(&storage, "correct horse battery", None)?;
//!
//! let raw = manager.read_envelope(&path)?;
//! let report = RestoreCoordinator::new(&storage).import_backup(
//!     &raw,
//!     &ImportOptions { passphrase: "correct horse battery", validate_only: false },
//! );
//! println!("{}", report.message());
//! ```
//!
//! [`BackupPayload`]: crate::models::BackupPayload

use std::fmt;

use thiserror::Error;

use crate::error::TallyError;

pub mod codec;
mod manager;
mod restore;

pub use codec::{collect, sanitize, CollectOutcome, Sanitized};
pub use manager::{BackupInfo, BackupManager, ExportedBackup};
pub use restore::{ImportOptions, RestoreCoordinator, RestoreReport};

/// One problem found while importing a backup
///
/// `Fatal` means nothing was written. Every other variant is recorded while
/// the import carries on with the remaining fields.
#[derive(Debug, Error)]
pub enum ImportIssue {
    #[error("{0}")]
    Fatal(TallyError),

    #[error("Transaction {index} dropped: {reason}")]
    InvalidTransaction { index: usize, reason: String },

    #[error("{field} dropped: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("{field} contained invalid entries and was reset to an empty list")]
    InvalidStringList { field: &'static str },

    #[error("Failed to restore {field}: {message}")]
    PersistField {
        field: &'static str,
        message: String,
    },

    #[error("Failed to rebuild summaries: {0}")]
    SummaryRebuild(String),
}

impl ImportIssue {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Why a field is missing from an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmissionReason {
    /// Nothing stored under the key
    NotFound,
    /// The store or the JSON decoder failed
    Unreadable(String),
}

/// A field left out of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOmission {
    pub field: &'static str,
    pub reason: OmissionReason,
}

impl fmt::Display for FieldOmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            OmissionReason::NotFound => write!(f, "{}: not found", self.field),
            OmissionReason::Unreadable(msg) => write!(f, "{}: unreadable ({})", self.field, msg),
        }
    }
}

impl FieldOmission {
    pub fn is_unreadable(&self) -> bool {
        matches!(self.reason, OmissionReason::Unreadable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_messages() {
        let issue = ImportIssue::InvalidTransaction {
            index: 3,
            reason: "amount must be a finite number > 0, got -1".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "Transaction 3 dropped: amount must be a finite number > 0, got -1"
        );

        let fatal = ImportIssue::Fatal(TallyError::SignatureMismatch);
        assert!(fatal.is_fatal());
        assert_eq!(fatal.to_string(), TallyError::SignatureMismatch.to_string());

        let list = ImportIssue::InvalidStringList { field: "accounts" };
        assert!(list.to_string().starts_with("accounts"));
    }

    #[test]
    fn test_omission_display() {
        let omission = FieldOmission {
            field: "firstName",
            reason: OmissionReason::Unreadable("Secure store is locked".to_string()),
        };
        assert!(omission.is_unreadable());
        assert_eq!(
            omission.to_string(),
            "firstName: unreadable (Secure store is locked)"
        );
    }
}
