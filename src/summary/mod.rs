//! Incrementally maintained summaries
//!
//! Monthly and per-category totals derived from the transaction log, kept
//! up to date one change at a time instead of recomputed on every write.

pub mod engine;
pub mod store;

pub use engine::{CategorySummary, MonthlyPruning, MonthlySummary, SummariesData, SUMMARY_EPSILON};
pub use store::SummaryStore;
