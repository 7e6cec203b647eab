use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::cli::{
    handle_account_command, handle_backup_command, handle_category_command,
    handle_profile_command, handle_summary_command, handle_transaction_command, open_storage,
    AccountCommands, BackupCommands, CategoryCommands, ProfileCommands, SummaryCommands,
    TransactionCommands, Unlock,
};
use tally::config::{Settings, TallyPaths};
use tally::logging::init_logging;
use tally::storage::initialize_storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Personal finance tracker with encrypted backups",
    long_about = "Tally records income and expenses, keeps monthly and per-category \
                  totals up to date as you go, and exports everything to a \
                  passphrase-protected backup file."
)]
struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Monthly and category totals
    #[command(subcommand)]
    Summary(SummaryCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Profile values kept in the encrypted store
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Encrypted backup export and import
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Set up the data directory with starter accounts and categories
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    // Initialize paths and settings
    let paths = TallyPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Transaction(cmd)) => {
            let storage = open_storage(&paths, &mut settings, Unlock::Never)?;
            handle_transaction_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Summary(cmd)) => {
            let storage = open_storage(&paths, &mut settings, Unlock::Never)?;
            handle_summary_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Account(cmd)) => {
            let storage = open_storage(&paths, &mut settings, Unlock::Never)?;
            handle_account_command(&storage, cmd)?;
        }
        Some(Commands::Category(cmd)) => {
            let storage = open_storage(&paths, &mut settings, Unlock::Never)?;
            handle_category_command(&storage, cmd)?;
        }
        Some(Commands::Profile(cmd)) => {
            let storage = open_storage(&paths, &mut settings, Unlock::Required)?;
            handle_profile_command(&storage, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            let unlock = if cmd.uses_secure_store() {
                Unlock::IfAvailable
            } else {
                Unlock::Never
            };
            let storage = open_storage(&paths, &mut settings, unlock)?;
            handle_backup_command(&paths, &settings, &storage, cmd)?;
        }
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!("Tally is already initialized at: {}", paths.base_dir().display());
            } else {
                println!("Initializing Tally at: {}", paths.base_dir().display());
            }
            let storage = open_storage(&paths, &mut settings, Unlock::Never)?;
            settings.save(&paths)?;
            let created = initialize_storage(&storage)?;
            println!("Initialization complete!");
            if !created.is_empty() {
                println!("Created starter lists: {}", created.join(", "));
            }
            println!();
            println!("Run 'tally account list' and 'tally category list' to see them.");
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Secure directory: {}", paths.secure_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Backup prefix:   {}", settings.app_name);
            println!(
                "  Secure store:    {}",
                if settings.secure_store.is_configured() {
                    "configured"
                } else {
                    "not set up"
                }
            );
        }
        None => {
            println!("Tally - personal finance tracker");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}
