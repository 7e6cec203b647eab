//! Backup CLI commands
//!
//! Implements CLI commands for encrypted export and import.

use clap::Subcommand;
use std::path::PathBuf;

use crate::backup::{BackupManager, ImportOptions, RestoreCoordinator};
use crate::config::{Settings, TallyPaths};
use crate::display::{format_backup_list, format_omissions, format_restore_report};
use crate::error::{TallyError, TallyResult};
use crate::storage::Storage;

use super::passphrase::{read_new_passphrase, read_passphrase, BACKUP_PASSPHRASE_ENV};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write an encrypted backup
    Export {
        /// Output file (defaults to the backup directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore from an encrypted backup
    Import {
        /// Backup file path
        file: PathBuf,

        /// Check the file and passphrase without changing anything
        #[arg(long)]
        validate_only: bool,
    },

    /// List backups in the backup directory
    List,
}

impl BackupCommands {
    /// Whether the command reads or writes profile fields
    pub fn uses_secure_store(&self) -> bool {
        !matches!(self, Self::List)
    }
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &TallyPaths,
    settings: &Settings,
    storage: &Storage,
    cmd: BackupCommands,
) -> TallyResult<()> {
    let manager = BackupManager::new(paths, settings);

    match cmd {
        BackupCommands::Export { output } => {
            let passphrase = read_new_passphrase(BACKUP_PASSPHRASE_ENV)?;
            let (path, exported) =
                manager.export_to_file(storage, &passphrase, output.as_deref())?;

            println!("Backup written to {}", path.display());
            if let Some(note) = format_omissions(&exported.omissions) {
                println!("{}", note);
            }
        }

        BackupCommands::Import {
            file,
            validate_only,
        } => {
            let raw = manager.read_envelope(&file)?;
            let passphrase = read_passphrase(BACKUP_PASSPHRASE_ENV, "Backup passphrase: ")?;

            let report = RestoreCoordinator::new(storage).import_backup(
                &raw,
                &ImportOptions {
                    passphrase: &passphrase,
                    validate_only,
                },
            );
            print!("{}", format_restore_report(&report, validate_only));

            if !report.success {
                return Err(TallyError::Validation(format!(
                    "Import reported {} issue(s)",
                    report.issues.len()
                )));
            }
        }

        BackupCommands::List => {
            let backups = manager.list_backups()?;
            println!("Backup directory: {}", manager.backup_dir().display());
            println!();
            print!("{}", format_backup_list(&backups));
            if !backups.is_empty() {
                println!();
            }
        }
    }

    Ok(())
}
