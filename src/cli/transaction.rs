//! Transaction CLI commands
//!
//! Implements CLI commands for recording and editing transactions.

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_transaction_details, format_transaction_list};
use crate::error::{TallyError, TallyResult};
use crate::models::TransactionType;
use crate::services::{Ledger, NewTransaction, TransactionFilter, TransactionUpdate};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// income or expense
        kind: String,
        /// Amount (positive)
        amount: f64,
        /// Category name
        #[arg(short, long)]
        category: String,
        /// Account name
        #[arg(short, long)]
        account: String,
        /// Date (YYYY-MM-DD or RFC 3339), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Note
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List transactions
    List {
        /// Only income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by account
        #[arg(short, long)]
        account: Option<String>,
        /// Filter by month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one transaction
    Show {
        /// Transaction ID
        id: String,
    },
    /// Change a transaction
    Edit {
        /// Transaction ID
        id: String,
        /// New type (income or expense)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// New amount
        #[arg(long)]
        amount: Option<f64>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New account
        #[arg(short, long)]
        account: Option<String>,
        /// New date
        #[arg(short, long)]
        date: Option<String>,
        /// New note (empty to clear)
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a transaction
    #[command(alias = "rm")]
    Remove {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> TallyResult<()> {
    let ledger = Ledger::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        TransactionCommands::Add {
            kind,
            amount,
            category,
            account,
            date,
            note,
        } => {
            let txn = ledger.add(NewTransaction {
                kind: parse_kind(&kind)?,
                amount,
                category,
                account,
                date: date.unwrap_or_else(|| Local::now().date_naive().to_string()),
                note,
            })?;
            println!("Recorded transaction {}", txn.id);
            print!("{}", format_transaction_details(&txn, symbol));
        }

        TransactionCommands::List {
            kind,
            category,
            account,
            month,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(kind) = kind {
                filter = filter.kind(parse_kind(&kind)?);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if let Some(account) = account {
                filter = filter.account(account);
            }
            if let Some(month) = month {
                let (year, month) = parse_month(&month)?;
                filter = filter.month(year, month);
            }

            let transactions = ledger.list(&filter)?;
            println!("{}", format_transaction_list(&transactions, symbol));
        }

        TransactionCommands::Show { id } => {
            let txn = ledger
                .get(&id)?
                .ok_or_else(|| TallyError::transaction_not_found(&id))?;
            print!("{}", format_transaction_details(&txn, symbol));
        }

        TransactionCommands::Edit {
            id,
            kind,
            amount,
            category,
            account,
            date,
            note,
        } => {
            let update = TransactionUpdate {
                kind: kind.as_deref().map(parse_kind).transpose()?,
                amount,
                category,
                account,
                date,
                note,
            };
            if update.is_empty() {
                println!("No changes specified.");
                return Ok(());
            }

            let txn = ledger.update(&id, update)?;
            println!("Updated transaction {}", txn.id);
            print!("{}", format_transaction_details(&txn, symbol));
        }

        TransactionCommands::Remove { id } => {
            let txn = ledger.remove(&id)?;
            println!("Removed transaction {} ({})", txn.id, txn);
        }
    }

    Ok(())
}

pub(crate) fn parse_kind(s: &str) -> TallyResult<TransactionType> {
    TransactionType::parse(s).ok_or_else(|| {
        TallyError::Validation(format!(
            "Invalid transaction type: '{}'. Use income or expense",
            s
        ))
    })
}

/// Parse `YYYY-MM`
pub(crate) fn parse_month(s: &str) -> TallyResult<(i32, u32)> {
    let invalid = || TallyError::Validation(format!("Invalid month '{}'. Use YYYY-MM", s));
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-01").unwrap(), (2024, 1));
        assert_eq!(parse_month(" 2023-12 ").unwrap(), (2023, 12));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("2024").is_err());
        assert!(parse_month("jan-2024").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("Income").unwrap(), TransactionType::Income);
        assert!(parse_kind("transfer").unwrap_err().is_validation());
    }
}
