//! Summary CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_amount, format_categories, format_monthly};
use crate::error::{TallyError, TallyResult};
use crate::services::Ledger;
use crate::storage::Storage;
use crate::summary::MonthlySummary;

use super::transaction::parse_month;

/// Summary subcommands
#[derive(Subcommand)]
pub enum SummaryCommands {
    /// Show monthly and category totals
    Show {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Number of months to show
        #[arg(short, long, default_value = "12")]
        limit: usize,
    },
    /// Recompute summaries from the full transaction log
    Rebuild,
    /// Check stored summaries against a full recomputation
    Verify,
}

/// Handle a summary command
pub fn handle_summary_command(
    storage: &Storage,
    settings: &Settings,
    cmd: SummaryCommands,
) -> TallyResult<()> {
    let ledger = Ledger::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        SummaryCommands::Show { month, limit } => {
            let summaries = ledger.summaries()?;

            if let Some(month) = month {
                let (year, month) = parse_month(&month)?;
                let found = summaries.month(year, month).ok_or_else(|| TallyError::NotFound {
                    entity_type: "Month",
                    identifier: format!("{}-{:02}", year, month),
                })?;
                println!("{}", format_monthly(&[found], symbol));
                return Ok(());
            }

            let monthly: Vec<&MonthlySummary> = summaries
                .monthly
                .iter()
                .filter(|m| m.transaction_count > 0)
                .take(limit)
                .collect();
            println!("{}", format_monthly(&monthly, symbol));
            println!();
            println!("{}", format_categories(&summaries.categories, symbol));

            let net: f64 = summaries.monthly.iter().map(|m| m.net).sum();
            println!();
            println!("Net across all months: {}", format_amount(net, symbol));
        }

        SummaryCommands::Rebuild => {
            let summaries = ledger.rebuild_summaries()?;
            println!(
                "Rebuilt summaries: {} month(s), {} category bucket(s)",
                summaries.monthly.len(),
                summaries.categories.len()
            );
        }

        SummaryCommands::Verify => {
            if ledger.verify_summaries()? {
                println!("Summaries are consistent with the transaction log.");
            } else {
                return Err(TallyError::Validation(
                    "Summaries differ from the transaction log. Run 'tally summary rebuild'."
                        .into(),
                ));
            }
        }
    }

    Ok(())
}
