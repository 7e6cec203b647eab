//! Display formatting for terminal output
//!
//! Plain-text tables for transactions, summaries, and backups.

pub mod backup;
pub mod summary;
pub mod transaction;

pub use backup::{format_backup_list, format_omissions, format_restore_report};
pub use summary::{format_categories, format_monthly};
pub use transaction::{format_transaction_details, format_transaction_list};

/// Format an amount with a currency symbol, e.g. `-$12.50`
pub fn format_amount(amount: f64, symbol: &str) -> String {
    // Avoid printing residue like -0.00
    let amount = if amount.abs() < 0.005 { 0.0 } else { amount };
    if amount < 0.0 {
        format!("-{}{:.2}", symbol, -amount)
    } else {
        format!("{}{:.2}", symbol, amount)
    }
}

/// Format a string list, one entry per line
pub fn format_name_list(names: &[String], empty: &str) -> String {
    if names.is_empty() {
        return format!("{}\n", empty);
    }
    names.iter().map(|n| format!("  {}\n", n)).collect()
}
