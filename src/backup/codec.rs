//! Backup payload assembly and validation
//!
//! [`collect`] reads every exportable value and never fails: unreadable
//! values are left out and reported. [`sanitize`] treats an imported payload
//! as untrusted and re-validates each slice on its own.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::crypto::CURRENT_BACKUP_VERSION;
use crate::models::{validate_transaction_value, BackupData, BackupPayload, Transaction};
use crate::storage::{get_json, keys, KeyValueStore, Storage};

use super::{FieldOmission, ImportIssue, OmissionReason};

/// Result of gathering local state for export
#[derive(Debug)]
pub struct CollectOutcome {
    pub payload: BackupPayload,
    pub omissions: Vec<FieldOmission>,
}

/// Result of validating an imported payload
#[derive(Debug, Default)]
pub struct Sanitized {
    pub data: BackupData,
    pub issues: Vec<ImportIssue>,
}

/// Gather every exportable value into a payload
pub fn collect(storage: &Storage) -> CollectOutcome {
    let mut omissions = Vec::new();
    let plain = storage.plain();
    let secure = storage.secure();

    let mut data = BackupData {
        transactions: read_field(plain, keys::TRANSACTIONS, &mut omissions),
        goals: read_field(plain, keys::GOALS, &mut omissions),
        accounts: read_field(plain, keys::ACCOUNTS, &mut omissions),
        expense_categories: read_field(plain, keys::EXPENSE_CATEGORIES, &mut omissions),
        income_categories: read_field(plain, keys::INCOME_CATEGORIES, &mut omissions),
        selected_currency: read_field(plain, keys::SELECTED_CURRENCY, &mut omissions),
        theme_mode: read_field(secure, keys::THEME_MODE, &mut omissions),
        first_name: read_field(secure, keys::FIRST_NAME, &mut omissions),
        last_name: read_field(secure, keys::LAST_NAME, &mut omissions),
        profile_picture: None,
    };

    let picture: Option<String> = read_field(secure, keys::PROFILE_PICTURE, &mut omissions);
    data.profile_picture = picture.filter(|p| !p.is_empty()).map(Some);

    debug!(
        fields = ?data.present_fields(),
        omitted = omissions.len(),
        "collected backup payload"
    );

    CollectOutcome {
        payload: BackupPayload {
            version: CURRENT_BACKUP_VERSION,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        },
        omissions,
    }
}

fn read_field<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &'static str,
    omissions: &mut Vec<FieldOmission>,
) -> Option<T> {
    match get_json(store, key) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            omissions.push(FieldOmission {
                field: key,
                reason: OmissionReason::NotFound,
            });
            None
        }
        Err(e) => {
            warn!(field = key, error = %e, "omitting unreadable field from backup");
            omissions.push(FieldOmission {
                field: key,
                reason: OmissionReason::Unreadable(e.to_string()),
            });
            None
        }
    }
}

/// Re-validate a decrypted payload
///
/// A missing or non-object `data` yields an empty result.
pub fn sanitize(payload: &Value) -> Sanitized {
    let mut out = Sanitized::default();
    let Some(data) = payload.get("data").and_then(Value::as_object) else {
        warn!("backup payload has no data object");
        return out;
    };

    out.data.transactions = sanitize_transactions(data, &mut out.issues);
    out.data.goals = sanitize_goals(data, &mut out.issues);
    out.data.accounts = sanitize_string_list(data, keys::ACCOUNTS, &mut out.issues);
    out.data.expense_categories =
        sanitize_string_list(data, keys::EXPENSE_CATEGORIES, &mut out.issues);
    out.data.income_categories =
        sanitize_string_list(data, keys::INCOME_CATEGORIES, &mut out.issues);
    out.data.selected_currency = data.get(keys::SELECTED_CURRENCY).cloned();
    out.data.theme_mode = string_field(data, keys::THEME_MODE);
    out.data.first_name = string_field(data, keys::FIRST_NAME);
    out.data.last_name = string_field(data, keys::LAST_NAME);
    out.data.profile_picture = match data.get(keys::PROFILE_PICTURE) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => {
            warn!(field = keys::PROFILE_PICTURE, "ignoring non-string value");
            None
        }
    };

    out
}

fn sanitize_transactions(
    data: &Map<String, Value>,
    issues: &mut Vec<ImportIssue>,
) -> Option<Vec<Transaction>> {
    let value = data.get(keys::TRANSACTIONS)?;
    let Some(entries) = value.as_array() else {
        issues.push(ImportIssue::InvalidField {
            field: keys::TRANSACTIONS,
            message: "expected an array".to_string(),
        });
        return None;
    };

    let mut kept = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match validate_transaction_value(entry) {
            Ok(txn) => kept.push(txn),
            Err(reason) => {
                warn!(index, %reason, "dropping invalid transaction");
                issues.push(ImportIssue::InvalidTransaction {
                    index,
                    reason: reason.to_string(),
                });
            }
        }
    }
    Some(kept)
}

// Goal records are opaque; only the container shape is checked
fn sanitize_goals(data: &Map<String, Value>, issues: &mut Vec<ImportIssue>) -> Option<Vec<Value>> {
    match data.get(keys::GOALS)? {
        Value::Array(goals) => Some(goals.clone()),
        _ => {
            issues.push(ImportIssue::InvalidField {
                field: keys::GOALS,
                message: "expected an array".to_string(),
            });
            None
        }
    }
}

fn sanitize_string_list(
    data: &Map<String, Value>,
    field: &'static str,
    issues: &mut Vec<ImportIssue>,
) -> Option<Vec<String>> {
    let value = data.get(field)?;
    let list = value.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().filter(|s| !s.is_empty()).map(str::to_string))
            .collect::<Option<Vec<String>>>()
    });

    match list {
        Some(list) => Some(list),
        None => {
            warn!(field, "string list has invalid entries; resetting");
            issues.push(ImportIssue::InvalidStringList { field });
            Some(Vec::new())
        }
    }
}

fn string_field(data: &Map<String, Value>, field: &'static str) -> Option<String> {
    match data.get(field)? {
        Value::String(s) => Some(s.clone()),
        _ => {
            warn!(field, "ignoring non-string value");
            None
        }
    }
}
