//! Backup files for Tally
//!
//! Exports are written as `<AppName>_Backup_<YYYYMMDD>.json` in the backup
//! directory unless the caller picks a path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Settings, TallyPaths};
use crate::crypto::{envelope, seal, CURRENT_BACKUP_VERSION};
use crate::error::{TallyError, TallyResult};
use crate::models::EncryptedBackup;
use crate::storage::file_io::{read_optional, write_atomic};
use crate::storage::Storage;

use super::codec::collect;
use super::FieldOmission;

/// A sealed export and what it left out
#[derive(Debug)]
pub struct ExportedBackup {
    pub envelope: EncryptedBackup,
    pub omissions: Vec<FieldOmission>,
}

/// Metadata about a backup file
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// Export time recorded in the envelope, if it parses
    pub created_at: Option<DateTime<Utc>>,
    /// Envelope version
    pub version: i64,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Creates, reads, and lists backup files
pub struct BackupManager {
    backup_dir: PathBuf,
    app_name: String,
}

impl BackupManager {
    pub fn new(paths: &TallyPaths, settings: &Settings) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            app_name: settings.app_name.clone(),
        }
    }

    /// Seal the current state into an envelope
    pub fn export(&self, storage: &Storage, passphrase: &str) -> TallyResult<ExportedBackup> {
        envelope::require_passphrase(passphrase)?;

        let outcome = collect(storage);
        let payload_json = serde_json::to_string(&outcome.payload)
            .map_err(|e| TallyError::Json(format!("Failed to serialize backup: {}", e)))?;
        let sealed = seal(&payload_json, passphrase)?;

        Ok(ExportedBackup {
            envelope: EncryptedBackup::new(i64::from(CURRENT_BACKUP_VERSION), Utc::now(), sealed),
            omissions: outcome.omissions,
        })
    }

    /// Export to `path`, or to the default file in the backup directory
    pub fn export_to_file(
        &self,
        storage: &Storage,
        passphrase: &str,
        path: Option<&Path>,
    ) -> TallyResult<(PathBuf, ExportedBackup)> {
        let exported = self.export(storage, passphrase)?;
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.backup_dir.join(self.default_filename(Utc::now())),
        };

        let json = serde_json::to_string_pretty(&exported.envelope)
            .map_err(|e| TallyError::Json(format!("Failed to serialize backup: {}", e)))?;
        write_atomic(&path, &json)?;

        info!(
            path = %path.display(),
            omitted = exported.omissions.len(),
            "backup exported"
        );
        Ok((path, exported))
    }

    /// Default backup file name for a given day
    pub fn default_filename(&self, now: DateTime<Utc>) -> String {
        format!("{}_Backup_{}.json", self.app_name, now.format("%Y%m%d"))
    }

    /// Read a backup file as raw JSON; the shape is checked on import
    pub fn read_envelope(&self, path: &Path) -> TallyResult<Value> {
        let contents = read_optional(path)?.ok_or_else(|| {
            TallyError::Io(format!("Backup file not found: {}", path.display()))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| TallyError::Json(format!("Failed to parse backup file: {}", e)))
    }

    /// List backups in the backup directory, newest first
    ///
    /// Files that are not backup envelopes are skipped.
    pub fn list_backups(&self) -> TallyResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            TallyError::Io(format!("Failed to read backup directory: {}", e))
        })? {
            let entry = entry.map_err(|e| {
                TallyError::Io(format!("Failed to read directory entry: {}", e))
            })?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match self.backup_info(&path) {
                    Some(info) => backups.push(info),
                    None => debug!(path = %path.display(), "skipping non-backup file"),
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    fn backup_info(&self, path: &Path) -> Option<BackupInfo> {
        let filename = path.file_name()?.to_string_lossy().to_string();
        let value = match self.read_envelope(path) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %filename, error = %e, "unreadable file in backup directory");
                return None;
            }
        };
        let envelope = EncryptedBackup::from_value(&value).ok()?;
        let size_bytes = fs::metadata(path).ok()?.len();

        Some(BackupInfo {
            filename,
            path: path.to_path_buf(),
            created_at: DateTime::parse_from_rfc3339(&envelope.timestamp)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            version: envelope.version,
            size_bytes,
        })
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{ImportOptions, OmissionReason, RestoreCoordinator};
    use crate::models::{Transaction, TransactionType};
    use crate::storage::{keys, set_json};
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    const PASS: &str = "backup-pass-1";

    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();

        let manager = BackupManager::new(&paths, &Settings::default());
        (manager, temp_dir)
    }

    fn seeded_storage() -> Storage {
        let storage = Storage::in_memory();
        let txns = vec![Transaction::new(
            "1",
            TransactionType::Income,
            250.0,
            "Salary",
            "Bank",
            "2024-03-01",
        )];
        set_json(storage.plain(), keys::TRANSACTIONS, &txns).unwrap();
        set_json(storage.plain(), keys::ACCOUNTS, &["Bank"]).unwrap();
        storage
    }

    #[test]
    fn test_default_filename() {
        let (manager, _temp) = create_test_manager();
        let day = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        assert_eq!(manager.default_filename(day), "Tally_Backup_20240704.json");
    }

    #[test]
    fn test_export_to_file_and_import() {
        let (manager, _temp) = create_test_manager();
        let source = seeded_storage();

        let (path, exported) = manager.export_to_file(&source, PASS, None).unwrap();
        assert!(path.exists());
        assert!(path.starts_with(manager.backup_dir()));
        assert!(exported
            .omissions
            .iter()
            .any(|o| o.field == "goals" && o.reason == OmissionReason::NotFound));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("Salary"));

        let raw = manager.read_envelope(&path).unwrap();
        let target = Storage::in_memory();
        let report = RestoreCoordinator::new(&target).import_backup(
            &raw,
            &ImportOptions {
                passphrase: PASS,
                validate_only: false,
            },
        );
        assert!(report.success, "{}", report.message());

        let accounts: Vec<String> = crate::storage::get_json(target.plain(), keys::ACCOUNTS)
            .unwrap()
            .unwrap();
        assert_eq!(accounts, vec!["Bank"]);
    }

    #[test]
    fn test_export_rejects_short_passphrase_without_writing() {
        let (manager, _temp) = create_test_manager();
        let result = manager.export_to_file(&seeded_storage(), "short", None);
        assert!(matches!(result, Err(TallyError::PassphraseTooShort { .. })));
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_export_to_explicit_path() {
        let (manager, temp) = create_test_manager();
        let target = temp.path().join("elsewhere.json");

        let (path, _) = manager
            .export_to_file(&seeded_storage(), PASS, Some(&target))
            .unwrap();
        assert_eq!(path, target);
        assert!(target.exists());
    }

    #[test]
    fn test_list_backups_skips_other_files() {
        let (manager, _temp) = create_test_manager();
        let dir = manager.backup_dir().clone();

        let older = json!({
            "version": 1, "timestamp": "2023-01-01T00:00:00.000Z", "encrypted": true,
            "sealedData": "AAAA", "signature": "00"
        });
        fs::write(dir.join("old.json"), older.to_string()).unwrap();
        fs::write(dir.join("notes.json"), r#"{"hello": "world"}"#).unwrap();
        fs::write(dir.join("broken.json"), "{").unwrap();
        fs::write(dir.join("readme.txt"), "hi").unwrap();

        manager.export_to_file(&seeded_storage(), PASS, None).unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].filename.starts_with("Tally_Backup_"));
        assert_eq!(backups[1].filename, "old.json");
        assert!(backups[0].created_at > backups[1].created_at);
        assert!(backups.iter().all(|b| b.version == 1 && b.size_bytes > 0));
    }

    #[test]
    fn test_read_missing_file() {
        let (manager, temp) = create_test_manager();
        let result = manager.read_envelope(&temp.path().join("nope.json"));
        assert!(matches!(result, Err(TallyError::Io(_))));
    }

    #[test]
    fn test_empty_backup_dir() {
        let (manager, _temp) = create_test_manager();
        assert!(manager.list_backups().unwrap().is_empty());
    }
}
