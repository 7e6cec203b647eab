//! Backup import for Tally
//!
//! The pipeline runs passphrase check, envelope shape, version gate,
//! signature check and decryption, then payload validation. Any failure up
//! to that point is fatal and nothing has been written. Persistence is
//! best-effort: each field is written on its own and a failure is recorded
//! without stopping the others.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::crypto::envelope::{self, check_version};
use crate::error::{TallyError, TallyResult};
use crate::models::{BackupData, EncryptedBackup};
use crate::storage::{keys, set_json, KeyValueStore, Storage};
use crate::summary::SummaryStore;

use super::codec::{sanitize, Sanitized};
use super::ImportIssue;

/// Options for [`RestoreCoordinator::import_backup`]
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions<'a> {
    pub passphrase: &'a str,
    /// Run every check but write nothing
    pub validate_only: bool,
}

/// Outcome of an import attempt
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// True exactly when `issues` is empty
    pub success: bool,
    pub issues: Vec<ImportIssue>,
    /// Fields found in the backup after validation
    pub found: Vec<&'static str>,
    /// Fields written to the stores
    pub restored: Vec<&'static str>,
    /// Whether summaries were rebuilt from the imported transactions
    pub summaries_rebuilt: bool,
}

impl RestoreReport {
    fn fatal(err: TallyError) -> Self {
        Self::finish(Self {
            issues: vec![ImportIssue::Fatal(err)],
            ..Default::default()
        })
    }

    fn finish(mut self) -> Self {
        self.success = self.issues.is_empty();
        self
    }

    /// Issue messages, one per line
    pub fn message(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_fatal(&self) -> bool {
        self.issues.iter().any(ImportIssue::is_fatal)
    }
}

/// Drives an import into a [`Storage`]
pub struct RestoreCoordinator<'a> {
    storage: &'a Storage,
}

impl<'a> RestoreCoordinator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Import a backup envelope
    ///
    /// Never fails outright; every problem is reported in the returned
    /// [`RestoreReport`].
    pub fn import_backup(&self, raw: &Value, options: &ImportOptions<'_>) -> RestoreReport {
        let Sanitized { data, issues } = match open_and_sanitize(raw, options.passphrase) {
            Ok(sanitized) => sanitized,
            Err(e) => {
                warn!(error = %e, "backup import rejected");
                return RestoreReport::fatal(e);
            }
        };

        let mut report = RestoreReport {
            found: data.present_fields(),
            issues,
            ..Default::default()
        };

        if options.validate_only {
            info!(fields = ?report.found, "backup validated, nothing written");
            return report.finish();
        }

        self.persist_all(&data, &mut report);

        if let Some(transactions) = &data.transactions {
            match SummaryStore::new(self.storage.plain()).recompute_and_save(transactions) {
                Ok(_) => report.summaries_rebuilt = true,
                Err(e) => {
                    warn!(error = %e, "summary rebuild after import failed");
                    report.issues.push(ImportIssue::SummaryRebuild(e.to_string()));
                }
            }
        }

        info!(
            restored = ?report.restored,
            issues = report.issues.len(),
            "backup import finished"
        );
        report.finish()
    }

    fn persist_all(&self, data: &BackupData, report: &mut RestoreReport) {
        let plain = self.storage.plain();
        let secure = self.storage.secure();

        if let Some(v) = &data.transactions {
            persist(plain, keys::TRANSACTIONS, v, report);
        }
        if let Some(v) = &data.goals {
            persist(plain, keys::GOALS, v, report);
        }
        if let Some(v) = &data.accounts {
            persist(plain, keys::ACCOUNTS, v, report);
        }
        if let Some(v) = &data.expense_categories {
            persist(plain, keys::EXPENSE_CATEGORIES, v, report);
        }
        if let Some(v) = &data.income_categories {
            persist(plain, keys::INCOME_CATEGORIES, v, report);
        }
        if let Some(v) = &data.selected_currency {
            persist(plain, keys::SELECTED_CURRENCY, v, report);
        }
        if let Some(v) = &data.theme_mode {
            persist(secure, keys::THEME_MODE, v, report);
        }
        if let Some(v) = &data.first_name {
            persist(secure, keys::FIRST_NAME, v, report);
        }
        if let Some(v) = &data.last_name {
            persist(secure, keys::LAST_NAME, v, report);
        }
        match &data.profile_picture {
            Some(Some(v)) => persist(secure, keys::PROFILE_PICTURE, v, report),
            Some(None) => record(
                keys::PROFILE_PICTURE,
                secure.remove(keys::PROFILE_PICTURE),
                report,
            ),
            None => {}
        }
    }
}

fn open_and_sanitize(raw: &Value, passphrase: &str) -> TallyResult<Sanitized> {
    envelope::require_passphrase(passphrase)?;
    let backup = EncryptedBackup::from_value(raw)?;
    check_version(backup.version)?;

    let plaintext = envelope::open(&backup, passphrase)?;
    let payload: Value = serde_json::from_str(&plaintext)
        .map_err(|e| TallyError::Json(format!("Backup payload is not valid JSON: {}", e)))?;

    Ok(sanitize(&payload))
}

fn persist<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    field: &'static str,
    value: &T,
    report: &mut RestoreReport,
) {
    record(field, set_json(store, field, value), report);
}

fn record(field: &'static str, result: TallyResult<()>, report: &mut RestoreReport) {
    match result {
        Ok(()) => report.restored.push(field),
        Err(e) => {
            warn!(field, error = %e, "failed to restore field");
            report.issues.push(ImportIssue::PersistField {
                field,
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::codec::collect;
    use crate::crypto::{seal, CURRENT_BACKUP_VERSION};
    use crate::models::{Transaction, TransactionType};
    use crate::storage::{get_json, LockedStore, MemoryStore};
    use crate::summary::{SummariesData, SUMMARY_EPSILON};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    const PASS: &str = "pw12345678";

    /// Store that counts writes and fails on selected keys
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: HashSet<&'static str>,
        writes: Mutex<usize>,
    }

    impl FlakyStore {
        fn failing(keys: &[&'static str]) -> Self {
            Self {
                failing: keys.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> TallyResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> TallyResult<()> {
            *self.writes.lock().unwrap() += 1;
            if self.failing.contains(key) {
                return Err(TallyError::Storage(format!("disk full writing {}", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> TallyResult<()> {
            *self.writes.lock().unwrap() += 1;
            self.inner.remove(key)
        }
    }

    fn envelope_json(payload: &Value, passphrase: &str) -> Value {
        let sealed = seal(&payload.to_string(), passphrase).unwrap();
        serde_json::to_value(EncryptedBackup::new(
            CURRENT_BACKUP_VERSION as i64,
            Utc::now(),
            sealed,
        ))
        .unwrap()
    }

    fn scenario_b_payload() -> Value {
        json!({
            "version": 1,
            "timestamp": "2024-02-01T00:00:00.000Z",
            "data": {
                "transactions": [
                    {"id": "1", "type": "Expense", "amount": 50, "category": "Food",
                     "account": "Cash", "date": "2024-01-15"},
                    {"id": "2", "type": "Income", "amount": 1000, "category": "Salary",
                     "account": "Bank", "date": "2024-01-20"}
                ],
                "accounts": ["Cash", "Bank"],
                "selectedCurrency": {"code": "USD", "symbol": "$"},
                "firstName": "Ada",
                "profilePicture": null
            }
        })
    }

    fn options(validate_only: bool) -> ImportOptions<'static> {
        ImportOptions {
            passphrase: PASS,
            validate_only,
        }
    }

    fn counting_storage() -> (Storage, Arc<FlakyStore>, Arc<FlakyStore>) {
        let plain = Arc::new(FlakyStore::default());
        let secure = Arc::new(FlakyStore::default());
        (
            Storage::new(plain.clone(), secure.clone()),
            plain,
            secure,
        )
    }

    #[test]
    fn test_scenario_b_export_import_round_trip() {
        let source = Storage::in_memory();
        let txns = vec![
            Transaction::new("1", TransactionType::Expense, 50.0, "Food", "Cash", "2024-01-15"),
            Transaction::new("2", TransactionType::Income, 1000.0, "Salary", "Bank", "2024-01-20"),
        ];
        set_json(source.plain(), keys::TRANSACTIONS, &txns).unwrap();
        set_json(source.plain(), keys::ACCOUNTS, &["Cash", "Bank"]).unwrap();
        set_json(source.plain(), keys::GOALS, &json!([{"name": "Bike", "target": 300}])).unwrap();
        set_json(source.secure(), keys::FIRST_NAME, "Ada").unwrap();
        set_json(source.secure(), keys::THEME_MODE, "dark").unwrap();

        let outcome = collect(&source);
        let payload = serde_json::to_value(&outcome.payload).unwrap();
        let raw = envelope_json(&payload, PASS);

        let target = Storage::in_memory();
        let report = RestoreCoordinator::new(&target).import_backup(&raw, &options(false));
        assert!(report.success, "{}", report.message());
        assert!(report.summaries_rebuilt);

        let restored: Vec<Transaction> = get_json(target.plain(), keys::TRANSACTIONS)
            .unwrap()
            .unwrap();
        assert_eq!(restored, txns);
        let accounts: Vec<String> = get_json(target.plain(), keys::ACCOUNTS).unwrap().unwrap();
        assert_eq!(accounts, vec!["Cash", "Bank"]);
        let name: String = get_json(target.secure(), keys::FIRST_NAME).unwrap().unwrap();
        assert_eq!(name, "Ada");

        let summaries = SummaryStore::new(target.plain()).load().unwrap();
        assert!(summaries.is_equivalent_to(&SummariesData::recompute_all(&txns), SUMMARY_EPSILON));
        let january = summaries.month(2024, 1).unwrap();
        assert_eq!(january.net, 950.0);
    }

    #[test]
    fn test_import_writes_in_field_order() {
        let (storage, plain, secure) = counting_storage();
        let raw = envelope_json(&scenario_b_payload(), PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(report.success, "{}", report.message());
        assert_eq!(
            report.restored,
            vec!["transactions", "accounts", "selectedCurrency", "firstName", "profilePicture"]
        );
        // transactions, accounts, selectedCurrency, summaries
        assert_eq!(plain.writes(), 4);
        // firstName set, profilePicture removed
        assert_eq!(secure.writes(), 2);
    }

    #[test]
    fn test_validate_only_writes_nothing() {
        let (storage, plain, secure) = counting_storage();
        let raw = envelope_json(&scenario_b_payload(), PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(true));
        assert!(report.success);
        assert!(report.restored.is_empty());
        assert!(!report.summaries_rebuilt);
        assert_eq!(report.found.len(), 5);
        assert_eq!(plain.writes() + secure.writes(), 0);
    }

    #[test]
    fn test_fatal_errors_write_nothing() {
        let good = envelope_json(&scenario_b_payload(), PASS);

        let mut tampered = good.clone();
        let sig = tampered["signature"].as_str().unwrap().to_string();
        let flipped = if sig.starts_with('0') { "1" } else { "0" };
        tampered["signature"] = json!(format!("{}{}", flipped, &sig[1..]));

        let mut newer = good.clone();
        newer["version"] = json!(2);

        let mut unencrypted = good.clone();
        unencrypted["encrypted"] = json!(false);

        fn label(e: &TallyError) -> &'static str {
            match e {
                TallyError::PassphraseTooShort { .. } => "short",
                TallyError::SignatureMismatch => "signature",
                TallyError::VersionTooNew { found: 2, .. } => "version",
                TallyError::InvalidEnvelopeFormat(_) => "format",
                _ => "other",
            }
        }

        let cases = vec![
            (good.clone(), "short", "short"),
            (tampered, PASS, "signature"),
            (newer, PASS, "version"),
            (unencrypted, PASS, "format"),
            (json!({"version": 1}), PASS, "format"),
            (good, "otherpass99", "signature"),
        ];

        for (raw, passphrase, expected) in cases {
            let (storage, plain, secure) = counting_storage();
            let report = RestoreCoordinator::new(&storage).import_backup(
                &raw,
                &ImportOptions {
                    passphrase,
                    validate_only: false,
                },
            );

            assert!(!report.success);
            assert!(report.is_fatal());
            assert_eq!(report.issues.len(), 1);
            match &report.issues[0] {
                ImportIssue::Fatal(e) => assert_eq!(label(e), expected, "{:?}", e),
                other => panic!("expected fatal issue, got {:?}", other),
            }
            assert_eq!(plain.writes() + secure.writes(), 0);
        }
    }

    #[test]
    fn test_non_json_plaintext_is_fatal() {
        let sealed = seal("definitely not json", PASS).unwrap();
        let raw = serde_json::to_value(EncryptedBackup::new(1, Utc::now(), sealed)).unwrap();

        let (storage, plain, _) = counting_storage();
        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(matches!(
            report.issues.as_slice(),
            [ImportIssue::Fatal(TallyError::Json(_))]
        ));
        assert_eq!(plain.writes(), 0);
    }

    #[test]
    fn test_persist_failure_does_not_stop_other_fields() {
        let plain = Arc::new(FlakyStore::failing(&["accounts"]));
        let storage = Storage::new(plain.clone(), MemoryStore::new());
        let raw = envelope_json(&scenario_b_payload(), PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(!report.success);
        assert_eq!(report.issues.len(), 1);
        assert!(matches!(
            &report.issues[0],
            ImportIssue::PersistField { field: "accounts", .. }
        ));
        assert!(report.restored.contains(&"transactions"));
        assert!(report.restored.contains(&"selectedCurrency"));
        assert!(report.restored.contains(&"firstName"));
        assert!(report.summaries_rebuilt);
        assert!(report.message().contains("disk full writing accounts"));
    }

    #[test]
    fn test_summary_rebuild_failure_is_reported() {
        let plain = Arc::new(FlakyStore::failing(&["summaries"]));
        let storage = Storage::new(plain, MemoryStore::new());
        let raw = envelope_json(&scenario_b_payload(), PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(!report.success);
        assert!(matches!(
            report.issues.as_slice(),
            [ImportIssue::SummaryRebuild(_)]
        ));
        assert!(report.restored.contains(&"transactions"));
    }

    #[test]
    fn test_overflowing_summaries_are_reported_not_stored() {
        let payload = json!({
            "version": 1,
            "timestamp": "2024-02-01T00:00:00.000Z",
            "data": {
                "transactions": [
                    {"id": "1", "type": "Expense", "amount": 1e308, "category": "Rent",
                     "account": "Bank", "date": "2024-01-01"},
                    {"id": "2", "type": "Expense", "amount": 1e308, "category": "Rent",
                     "account": "Bank", "date": "2024-01-02"}
                ]
            }
        });
        let storage = Storage::in_memory();
        let raw = envelope_json(&payload, PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(!report.summaries_rebuilt);
        assert!(matches!(
            report.issues.as_slice(),
            [ImportIssue::SummaryRebuild(_)]
        ));
        assert!(storage.plain().get(keys::SUMMARIES).unwrap().is_none());
    }

    #[test]
    fn test_locked_secure_store_reports_each_profile_field() {
        let storage = Storage::new(MemoryStore::new(), LockedStore);
        let raw = envelope_json(&scenario_b_payload(), PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        let failed: Vec<_> = report
            .issues
            .iter()
            .filter_map(|i| match i {
                ImportIssue::PersistField { field, .. } => Some(*field),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec!["firstName", "profilePicture"]);
        assert!(report.restored.contains(&"transactions"));
    }

    #[test]
    fn test_empty_transactions_still_rebuild_summaries() {
        let storage = Storage::in_memory();
        SummaryStore::new(storage.plain())
            .apply_add(&Transaction::new(
                "old",
                TransactionType::Expense,
                5.0,
                "Food",
                "Cash",
                "2023-05-05",
            ))
            .unwrap();

        let raw = envelope_json(&json!({"version": 1, "data": {"transactions": []}}), PASS);
        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(report.success);

        let summaries = SummaryStore::new(storage.plain()).load().unwrap();
        assert!(summaries.monthly.is_empty());
        assert!(summaries.categories.is_empty());
    }

    #[test]
    fn test_dropped_transactions_fail_the_report() {
        let payload = json!({"version": 1, "data": {"transactions": [
            {"id": "1", "type": "Expense", "amount": 50, "category": "Food",
             "account": "Cash", "date": "2024-01-15"},
            {"id": "2", "type": "Expense", "amount": -1, "category": "Food",
             "account": "Cash", "date": "2024-01-15"}
        ]}});
        let storage = Storage::in_memory();
        let raw = envelope_json(&payload, PASS);

        let report = RestoreCoordinator::new(&storage).import_backup(&raw, &options(false));
        assert!(!report.success);
        assert!(!report.is_fatal());

        let restored: Vec<Transaction> = get_json(storage.plain(), keys::TRANSACTIONS)
            .unwrap()
            .unwrap();
        assert_eq!(restored.len(), 1);
        let summaries = SummaryStore::new(storage.plain()).load().unwrap();
        assert_eq!(summaries.month(2024, 1).unwrap().expense, 50.0);
    }
}
