//! Core data models for Tally
//!
//! Transactions and the backup formats. Aggregate summaries are derived data
//! and live in [`crate::summary`].

pub mod backup;
pub mod transaction;

pub use backup::{BackupData, BackupPayload, EncryptedBackup};
pub use transaction::{
    parse_timestamp, validate_transaction_value, Transaction, TransactionType,
    TransactionValidationError,
};
