//! Account and category CLI commands
//!
//! Both are plain name lists that transactions refer to by value.

use clap::Subcommand;

use crate::display::format_name_list;
use crate::error::TallyResult;
use crate::models::TransactionType;
use crate::services::Ledger;
use crate::storage::Storage;

use super::transaction::parse_kind;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Add an account
    Add {
        /// Account name
        name: String,
    },
    /// List accounts
    List,
}

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,
    },
    /// List categories
    List {
        /// Only income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
}

/// Handle an account command
pub fn handle_account_command(storage: &Storage, cmd: AccountCommands) -> TallyResult<()> {
    let ledger = Ledger::new(storage);

    match cmd {
        AccountCommands::Add { name } => {
            ledger.add_account(&name)?;
            println!("Added account: {}", name.trim());
        }
        AccountCommands::List => {
            print!("{}", format_name_list(&ledger.accounts()?, "No accounts found."));
        }
    }

    Ok(())
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> TallyResult<()> {
    let ledger = Ledger::new(storage);

    match cmd {
        CategoryCommands::Add { name, kind } => {
            let kind = parse_kind(&kind)?;
            ledger.add_category(kind, &name)?;
            println!("Added {} category: {}", kind.as_str().to_lowercase(), name.trim());
        }
        CategoryCommands::List { kind } => {
            let kinds = match kind {
                Some(kind) => vec![parse_kind(&kind)?],
                None => vec![TransactionType::Expense, TransactionType::Income],
            };
            for kind in kinds {
                println!("{} categories:", kind);
                print!("{}", format_name_list(&ledger.categories(kind)?, "  (none)"));
            }
        }
    }

    Ok(())
}
