//! Service layer for Tally
//!
//! Services sit on top of the storage layer and keep derived state in step
//! with the data it is derived from.

pub mod ledger;
pub mod profile;

pub use ledger::{Ledger, NewTransaction, TransactionFilter, TransactionUpdate};
pub use profile::{Profile, ProfileField, ProfileService};
