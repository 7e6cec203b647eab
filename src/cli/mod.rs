//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod lists;
pub mod passphrase;
pub mod profile;
pub mod session;
pub mod summary;
pub mod transaction;

pub use backup::{handle_backup_command, BackupCommands};
pub use lists::{handle_account_command, handle_category_command, AccountCommands, CategoryCommands};
pub use profile::{handle_profile_command, ProfileCommands};
pub use session::{open_storage, Unlock};
pub use summary::{handle_summary_command, SummaryCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
