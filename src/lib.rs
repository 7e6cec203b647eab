//! Tally - personal finance tracking core
//!
//! Tally keeps a transaction log with monthly and per-category summaries
//! maintained incrementally, and moves the whole local state in and out of
//! passphrase-protected backup files.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: At-rest encryption and the backup envelope
//! - `models`: Transactions and backup formats
//! - `storage`: Key-value stores (plain, encrypted, in-memory)
//! - `summary`: Incrementally maintained aggregates
//! - `services`: Ledger and profile operations
//! - `backup`: Export, validation, and restore
//! - `logging`: Subscriber setup for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::services::{Ledger, NewTransaction};
//! use tally::storage::Storage;
//!
//! let storage = Storage::in_memory();
//! let ledger = Ledger::new(&storage);
//! ledger.add(NewTransaction { /* ... */ })?;
//! assert!(ledger.verify_summaries()?);
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod summary;

pub use error::{TallyError, TallyResult};
